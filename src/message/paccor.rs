// Copyright 2025 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::errors::Error;
use serde::{Deserialize, Serialize};

/// A hardware component as reported by the PACCOR collector
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentInfo {
    pub manufacturer: String,
    pub model: String,
    pub serial_number: Option<String>,
    pub revision: Option<String>,
    pub component_class_registry: Option<String>,
    pub component_class_value: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "UPPERCASE")]
struct PaccorOutput {
    #[serde(default)]
    components: Vec<PaccorComponent>,
}

#[derive(Deserialize)]
#[serde(rename_all = "UPPERCASE")]
struct PaccorComponent {
    componentclass: Option<PaccorClass>,
    manufacturer: String,
    model: String,
    serial: Option<String>,
    revision: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "UPPERCASE")]
struct PaccorClass {
    componentclassregistry: Option<String>,
    componentclassvalue: Option<String>,
}

impl ComponentInfo {
    /// Extract the component list from the collector's JSON output.  Empty
    /// output yields no components.
    pub fn parse_paccor(output: &str) -> Result<Vec<Self>, Error> {
        if output.trim().is_empty() {
            return Ok(vec![]);
        }

        let p: PaccorOutput =
            serde_json::from_str(output).map_err(|e| Error::Parse(e.to_string()))?;

        Ok(p.components
            .into_iter()
            .map(|c| {
                let (registry, value) = match c.componentclass {
                    Some(cc) => (cc.componentclassregistry, cc.componentclassvalue),
                    None => (None, None),
                };

                ComponentInfo {
                    manufacturer: c.manufacturer.trim().to_string(),
                    model: c.model.trim().to_string(),
                    serial_number: c.serial.filter(|s| !s.trim().is_empty()),
                    revision: c.revision.filter(|s| !s.trim().is_empty()),
                    component_class_registry: registry,
                    component_class_value: value,
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_PACCOR_OUTPUT: &str = r#"{
        "PLATFORM": {"PLATFORMMANUFACTURERSTR": "Example Corp"},
        "COMPONENTS": [
            {
                "COMPONENTCLASS": {
                    "COMPONENTCLASSREGISTRY": "2.23.133.18.3.1",
                    "COMPONENTCLASSVALUE": "00030003"
                },
                "MANUFACTURER": "Intel Corporation ",
                "MODEL": "Xeon",
                "SERIAL": "",
                "REVISION": "6"
            },
            {
                "MANUFACTURER": "Samsung",
                "MODEL": "M393A2K43BB1-CTD",
                "SERIAL": "3321DA02"
            }
        ]
    }"#;

    #[test]
    fn parse_components() {
        let cs = ComponentInfo::parse_paccor(TEST_PACCOR_OUTPUT).unwrap();

        assert_eq!(cs.len(), 2);

        assert_eq!(cs[0].manufacturer, "Intel Corporation");
        assert_eq!(cs[0].serial_number, None);
        assert_eq!(cs[0].revision.as_deref(), Some("6"));
        assert_eq!(cs[0].component_class_value.as_deref(), Some("00030003"));

        assert_eq!(cs[1].serial_number.as_deref(), Some("3321DA02"));
        assert_eq!(cs[1].component_class_registry, None);
    }

    #[test]
    fn parse_empty() {
        assert!(ComponentInfo::parse_paccor("  ").unwrap().is_empty());
    }

    #[test]
    fn parse_invalid() {
        assert!(ComponentInfo::parse_paccor("{\"COMPONENTS\": 3}").is_err());
    }
}
