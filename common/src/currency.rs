//! [`Currency`] definitions.

use crate::define_kind;

define_kind! {
    #[doc = "Currency a user keeps their books in."]
    enum Currency {
        #[doc = "US Dollar."]
        Usd = 1,

        #[doc = "Euro."]
        Eur = 2,

        #[doc = "Pound Sterling."]
        Gbp = 3,

        #[doc = "Colombian Peso."]
        Cop = 4,
    }
}

impl Default for Currency {
    fn default() -> Self {
        Self::Usd
    }
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use super::Currency;

    #[test]
    fn from_str() {
        assert_eq!(Currency::from_str("USD").unwrap(), Currency::Usd);
        assert_eq!(Currency::from_str("EUR").unwrap(), Currency::Eur);
        assert_eq!(Currency::from_str("GBP").unwrap(), Currency::Gbp);
        assert_eq!(Currency::from_str("COP").unwrap(), Currency::Cop);

        assert!(Currency::from_str("usd").is_err());
        assert!(Currency::from_str("US").is_err());
        assert!(Currency::from_str("").is_err());
    }

    #[test]
    fn to_string() {
        assert_eq!(Currency::Usd.to_string(), "USD");
        assert_eq!(Currency::Eur.to_string(), "EUR");
        assert_eq!(Currency::Gbp.to_string(), "GBP");
        assert_eq!(Currency::Cop.to_string(), "COP");
    }

    #[test]
    fn u8_representation() {
        for c in [Currency::Usd, Currency::Eur, Currency::Gbp, Currency::Cop] {
            assert_eq!(Currency::from_u8(c.u8()), Some(c));
        }
        assert_eq!(Currency::from_u8(0), None);
        assert_eq!(Currency::from_u8(5), None);
    }

    #[test]
    fn defaults_to_usd() {
        assert_eq!(Currency::default(), Currency::Usd);
    }
}
