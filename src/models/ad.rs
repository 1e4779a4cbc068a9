//! Listing ("ad") model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Moderation status of a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdStatus {
    Pending,
    Approved,
    Rejected,
    Draft,
}

impl AdStatus {
    pub const ALL: [AdStatus; 4] = [
        AdStatus::Pending,
        AdStatus::Approved,
        AdStatus::Rejected,
        AdStatus::Draft,
    ];

    /// Wire name, as used in query strings and JSON
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Draft => "draft",
        }
    }
}

impl std::fmt::Display for AdStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AdStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "draft" => Ok(Self::Draft),
            _ => Err(format!("Invalid ad status: {}", s)),
        }
    }
}

/// Listing priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[default]
    Normal,
    Urgent,
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Normal => write!(f, "normal"),
            Self::Urgent => write!(f, "urgent"),
        }
    }
}

/// Seller of a listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Seller {
    pub id: i64,
    pub name: String,
    pub rating: f64,
    pub total_ads: u32,
    pub registered_at: DateTime<Utc>,
}

/// Decision recorded in a listing's moderation history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ModerationAction {
    Approved,
    Rejected,
    RequestChanges,
}

/// One entry of the moderation history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModerationHistoryItem {
    pub id: i64,
    pub moderator_id: i64,
    pub moderator_name: String,
    pub action: ModerationAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Listing entity as returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ad {
    pub id: i64,
    pub title: String,
    pub price: f64,
    pub description: String,
    #[serde(default)]
    pub images: Vec<String>,
    pub category: String,
    pub category_id: u32,
    pub status: AdStatus,
    #[serde(default)]
    pub priority: Priority,
    pub created_at: DateTime<Utc>,
    pub seller: Seller,
    #[serde(default)]
    pub characteristics: BTreeMap<String, String>,
    #[serde(default)]
    pub moderation_history: Vec<ModerationHistoryItem>,
}

impl Ad {
    /// Only pending listings accept a decision
    pub fn awaits_decision(&self) -> bool {
        self.status == AdStatus::Pending
    }

    pub fn is_urgent(&self) -> bool {
        self.priority == Priority::Urgent
    }

    /// Most recent moderation decision, if any
    pub fn last_decision(&self) -> Option<&ModerationHistoryItem> {
        self.moderation_history.iter().max_by_key(|item| item.timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const AD_JSON: &str = r#"{
        "id": 17,
        "title": "Велосипед",
        "price": 15000,
        "description": "Почти новый",
        "images": ["https://img.example/1.jpg"],
        "category": "Транспорт",
        "categoryId": 2,
        "status": "pending",
        "priority": "urgent",
        "createdAt": "2025-03-01T10:00:00.000Z",
        "seller": {
            "id": 5,
            "name": "Иван",
            "rating": 4.7,
            "totalAds": 12,
            "registeredAt": "2023-01-01T00:00:00Z"
        },
        "characteristics": {"Цвет": "Синий"},
        "moderationHistory": [
            {
                "id": 1,
                "moderatorId": 9,
                "moderatorName": "Мария",
                "action": "requestChanges",
                "reason": "Проблемы с фото",
                "timestamp": "2025-03-02T10:00:00Z"
            },
            {
                "id": 2,
                "moderatorId": 9,
                "moderatorName": "Мария",
                "action": "rejected",
                "timestamp": "2025-03-03T10:00:00Z"
            }
        ]
    }"#;

    #[test]
    fn test_deserialize_ad() {
        let ad: Ad = serde_json::from_str(AD_JSON).unwrap();

        assert_eq!(ad.id, 17);
        assert_eq!(ad.category_id, 2);
        assert_eq!(ad.status, AdStatus::Pending);
        assert!(ad.is_urgent());
        assert!(ad.awaits_decision());
        assert_eq!(ad.seller.total_ads, 12);
        assert_eq!(ad.characteristics.get("Цвет").map(String::as_str), Some("Синий"));
        assert_eq!(ad.moderation_history[0].action, ModerationAction::RequestChanges);
        assert_eq!(ad.moderation_history[1].comment, None);
        assert_eq!(ad.last_decision().map(|h| h.id), Some(2));
    }

    #[test]
    fn test_status_parsing_is_exact() {
        for status in AdStatus::ALL {
            assert_eq!(status.as_str().parse::<AdStatus>().unwrap(), status);
        }
        assert!("Pending".parse::<AdStatus>().is_err());
        assert!("archived".parse::<AdStatus>().is_err());
    }

    #[test]
    fn test_missing_priority_defaults_to_normal() {
        let mut value: serde_json::Value = serde_json::from_str(AD_JSON).unwrap();
        value.as_object_mut().unwrap().remove("priority");

        let ad: Ad = serde_json::from_value(value).unwrap();
        assert_eq!(ad.priority, Priority::Normal);
    }
}
