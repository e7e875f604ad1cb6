use serde::Serialize;
use serde_json::Value;

/// A funding_pages row. Drafts and live campaigns share this shape; status
/// is derived from the two visibility flags, following the original data
/// model where a draft is simply an unpublished page.
#[derive(Debug, Clone, Serialize)]
pub struct Campaign {
    pub id: String,
    pub user_id: i64,
    pub title: String,
    pub description: String,
    pub bitcoin_address: String,
    pub lightning_address: String,
    pub website_url: String,
    pub goal_amount: Option<f64>,
    pub category: String,
    pub currency: String,
    pub is_active: bool,
    pub is_public: bool,
    pub total_funding: f64,
    pub contributor_count: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl Campaign {
    pub fn is_draft(&self) -> bool {
        !self.is_active && !self.is_public
    }

    pub fn is_paused(&self) -> bool {
        !self.is_active && self.is_public
    }

    pub fn is_live(&self) -> bool {
        self.is_active && self.is_public
    }
}

/// Scalar campaign fields extracted from a wizard form snapshot, used for
/// draft create/update and for publishing.
#[derive(Debug, Clone, Default)]
pub struct CampaignFields {
    pub title: String,
    pub description: String,
    pub bitcoin_address: String,
    pub lightning_address: String,
    pub website_url: String,
    pub goal_amount: Option<f64>,
    pub category: String,
}

impl CampaignFields {
    /// Build from an opaque form snapshot. Missing fields default; the goal
    /// amount accepts both numeric and string inputs and drops anything
    /// unparseable rather than failing the save.
    pub fn from_form(form: &Value) -> Self {
        let text = |key: &str| {
            form.get(key)
                .and_then(Value::as_str)
                .unwrap_or("")
                .trim()
                .to_string()
        };

        CampaignFields {
            title: text("title"),
            description: text("description"),
            bitcoin_address: text("bitcoin_address"),
            lightning_address: text("lightning_address"),
            website_url: text("website_url"),
            goal_amount: safe_parse_amount(form.get("goal_amount")),
            category: text("category"),
        }
    }
}

/// Parse a goal amount that may arrive as a JSON number or a string typed
/// into a form field. Returns None for absent, empty, or non-numeric input.
fn safe_parse_amount(value: Option<&Value>) -> Option<f64> {
    match value {
        Some(Value::Number(n)) => n.as_f64().filter(|v| v.is_finite()),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_form_parses_string_and_numeric_amounts() {
        let fields = CampaignFields::from_form(&json!({
            "title": "  Solar Farm  ",
            "goal_amount": "0.5",
        }));
        assert_eq!(fields.title, "Solar Farm");
        assert_eq!(fields.goal_amount, Some(0.5));

        let fields = CampaignFields::from_form(&json!({ "goal_amount": 2 }));
        assert_eq!(fields.goal_amount, Some(2.0));
    }

    #[test]
    fn from_form_drops_bad_amounts() {
        let fields = CampaignFields::from_form(&json!({ "goal_amount": "lots" }));
        assert_eq!(fields.goal_amount, None);

        let fields = CampaignFields::from_form(&json!({ "goal_amount": "" }));
        assert_eq!(fields.goal_amount, None);
    }
}
