use serde::{Deserialize, Serialize};

/// A single normalized car-rental offer extracted from the source page.
///
/// `name` is the only field the minimal extraction path guarantees; the
/// rest are absent whenever their selector matched nothing. Absent fields
/// are omitted from the JSON output rather than serialized as empty
/// strings.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Listing {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,

    #[serde(rename = "imageUrl", skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    #[serde(rename = "detailUrl", skip_serializing_if = "Option::is_none")]
    pub detail_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_fields_are_omitted() {
        let listing = Listing {
            name: "VW Golf".to_string(),
            price: None,
            image_url: None,
            detail_url: None,
        };

        let json = serde_json::to_value(&listing).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 1);
        assert_eq!(obj["name"], "VW Golf");
    }

    #[test]
    fn test_populated_listing_uses_camel_case() {
        let listing = Listing {
            name: "Fiat Panda".to_string(),
            price: Some("€29/day".to_string()),
            image_url: Some("https://example.com/panda.jpg".to_string()),
            detail_url: Some("https://example.com/panda".to_string()),
        };

        let json = serde_json::to_value(&listing).unwrap();
        assert_eq!(json["price"], "€29/day");
        assert_eq!(json["imageUrl"], "https://example.com/panda.jpg");
        assert_eq!(json["detailUrl"], "https://example.com/panda");
    }
}
