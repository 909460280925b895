use std::{str::FromStr, time::Duration};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::NaiveDate;
use reqwest::blocking::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::AssistantConfig;
use crate::domain::{Category, CategoryCatalog};

use super::{AssistError, ExpenseAssistant, ReceiptExtraction, ReceiptImage};

const RECEIPT_PROMPT: &str = "Analyze this receipt image and extract the following information:
1.  A short description of the vendor or store name.
2.  The final total amount.
3.  The date of the transaction in YYYY-MM-DD format.

Return the result in a JSON format.";

/// Client for the Gemini `generateContent` endpoint with JSON-schema output.
pub struct GeminiAssistant {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl GeminiAssistant {
    pub fn new(config: &AssistantConfig, api_key: String) -> Result<Self, AssistError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
        })
    }

    fn generate(&self, parts: Value, schema: Value) -> Result<Value, AssistError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.endpoint, self.model
        );
        let body = json!({
            "contents": [{ "parts": parts }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": schema,
            },
        });

        tracing::debug!(model = %self.model, "sending assistant request");
        let resp = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(AssistError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let out: GenerateResponse = resp.json()?;
        let text = out.first_text().ok_or_else(|| {
            AssistError::Malformed("response carried no text candidate".into())
        })?;
        serde_json::from_str(&text).map_err(|err| AssistError::Malformed(err.to_string()))
    }
}

impl ExpenseAssistant for GeminiAssistant {
    fn name(&self) -> &str {
        &self.model
    }

    fn categorize(
        &self,
        description: &str,
        catalog: &CategoryCatalog,
    ) -> Result<Category, AssistError> {
        let names: Vec<&str> = catalog.names().collect();
        let listed = names.join(", ");
        let prompt = format!(
            "Analyze the expense description and categorize it into one of the following options: {listed}. Description: \"{description}\""
        );
        let schema = json!({
            "type": "OBJECT",
            "properties": {
                "category": {
                    "type": "STRING",
                    "description": format!("The expense category, which must be one of: {listed}."),
                    "enum": names,
                },
            },
            "required": ["category"],
        });

        let parsed = self.generate(json!([{ "text": prompt }]), schema)?;
        parse_category(&parsed, catalog)
    }

    fn extract_receipt(&self, image: &ReceiptImage) -> Result<ReceiptExtraction, AssistError> {
        let parts = json!([
            {
                "inlineData": {
                    "mimeType": image.mime_type,
                    "data": STANDARD.encode(&image.bytes),
                },
            },
            { "text": RECEIPT_PROMPT },
        ]);
        let schema = json!({
            "type": "OBJECT",
            "properties": {
                "description": { "type": "STRING", "description": "The vendor or store name." },
                "amount": { "type": "NUMBER", "description": "The final total amount of the transaction." },
                "date": { "type": "STRING", "description": "The date of the transaction in YYYY-MM-DD format." },
            },
            "required": ["description", "amount", "date"],
        });

        let parsed = self.generate(parts, schema)?;
        let extraction = parse_receipt(&parsed);
        if extraction.is_empty() {
            return Err(AssistError::NoSuggestion);
        }
        Ok(extraction)
    }
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    text: Option<String>,
}

impl GenerateResponse {
    fn first_text(self) -> Option<String> {
        let content = self.candidates.into_iter().find_map(|c| c.content)?;
        let text: String = content.parts.into_iter().filter_map(|p| p.text).collect();
        Some(text).filter(|t| !t.trim().is_empty())
    }
}

fn parse_category(parsed: &Value, catalog: &CategoryCatalog) -> Result<Category, AssistError> {
    parsed
        .get("category")
        .and_then(Value::as_str)
        .and_then(|name| catalog.resolve(name))
        .ok_or(AssistError::NoSuggestion)
}

/// Keeps only the fields that are present and well-typed.
fn parse_receipt(parsed: &Value) -> ReceiptExtraction {
    let description = parsed
        .get("description")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    let amount = match parsed.get("amount") {
        Some(Value::Number(number)) => decimal_from_number(&number.to_string()),
        _ => None,
    }
    .filter(|amount| *amount > Decimal::ZERO);

    let date = parsed
        .get("date")
        .and_then(Value::as_str)
        .and_then(|raw| NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok());

    ReceiptExtraction {
        description,
        amount,
        date,
    }
}

fn decimal_from_number(raw: &str) -> Option<Decimal> {
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn receipt_fields_are_taken_individually() {
        let parsed = json!({ "description": "Corner Market", "amount": "12.40", "date": "2024-07-04" });
        let extraction = parse_receipt(&parsed);
        assert_eq!(extraction.description.as_deref(), Some("Corner Market"));
        assert_eq!(extraction.amount, None, "string amounts are mistyped");
        assert_eq!(extraction.date, NaiveDate::from_ymd_opt(2024, 7, 4));
    }

    #[test]
    fn receipt_amount_keeps_decimal_digits() {
        let parsed = json!({ "description": "", "amount": 23.75, "date": "07/04/2024" });
        let extraction = parse_receipt(&parsed);
        assert_eq!(extraction.description, None);
        assert_eq!(extraction.amount, Some(Decimal::from_str("23.75").unwrap()));
        assert_eq!(extraction.date, None);
    }

    #[test]
    fn category_must_be_in_catalog() {
        let catalog = CategoryCatalog::standard();
        let ok = parse_category(&json!({ "category": "dining out" }), &catalog).unwrap();
        assert_eq!(ok.name(), "Dining Out");
        assert!(parse_category(&json!({ "category": "Yachts" }), &catalog).is_err());
        assert!(parse_category(&json!({}), &catalog).is_err());
    }

    #[test]
    fn response_text_parts_are_joined() {
        let resp: GenerateResponse = serde_json::from_value(json!({
            "candidates": [{ "content": { "parts": [{ "text": "{\"cat" }, { "text": "egory\":\"Rent\"}" }] } }]
        }))
        .unwrap();
        assert_eq!(resp.first_text().as_deref(), Some("{\"category\":\"Rent\"}"));
    }

    #[test]
    fn empty_candidates_have_no_text() {
        let resp: GenerateResponse = serde_json::from_value(json!({})).unwrap();
        assert!(resp.first_text().is_none());
    }
}
