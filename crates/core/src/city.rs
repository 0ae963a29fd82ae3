//! Per-city contact data merged into outgoing emails.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A city with its contact details, as edited by operators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct City {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub vk: String,
}

/// Validate that every city field is non-empty.
pub fn validate_city(city: &City) -> Result<(), CoreError> {
    let empty: Vec<&str> = [
        ("name", &city.name),
        ("phone", &city.phone),
        ("email", &city.email),
        ("vk", &city.vk),
    ]
    .into_iter()
    .filter(|(_, value)| value.is_empty())
    .map(|(field, _)| field)
    .collect();

    if empty.is_empty() {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "City fields must not be empty: {}",
            empty.join(", ")
        )))
    }
}

/// One row of the city listing. Fields absent from a mapping are `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CityListing {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub vk: Option<String>,
}

/// Contact values substituted into the email body.
///
/// Unknown cities resolve to empty strings rather than an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CityContact {
    pub phone: String,
    pub email: String,
    pub vk: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_empty_fields_are_listed() {
        let city = City {
            name: "Kazan".into(),
            phone: String::new(),
            email: "k@example.com".into(),
            vk: String::new(),
        };
        let err = validate_city(&city).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Validation failed: City fields must not be empty: phone, vk"
        );
    }

    #[test]
    fn complete_city_passes() {
        let city = City {
            name: "Kazan".into(),
            phone: "+7 000".into(),
            email: "k@example.com".into(),
            vk: "vk.com/kazan".into(),
        };
        assert!(validate_city(&city).is_ok());
    }
}
