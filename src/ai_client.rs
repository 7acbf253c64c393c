use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::configuration::AiSettings;
use crate::error::{AppError, UpstreamError};

const SERVICE: &str = "AI";

/// Client for an OpenAI-compatible `/chat/completions` endpoint
#[derive(Clone)]
pub struct AiClient {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    content: Option<String>,
}

/// What the user asked for when generating an itinerary
#[derive(Debug, Clone)]
pub struct ItineraryPrompt {
    pub destination: String,
    pub days: i32,
    pub travel_type: String,
    pub budget: String,
    pub mood: String,
    pub include_pois: bool,
}

/// One day of a generated itinerary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayPlan {
    pub day: u32,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub places: Vec<PlannedPlace>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedPlace {
    pub name: String,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PlanEnvelope {
    Days(Vec<DayPlan>),
    Wrapped { plan: Vec<DayPlan> },
}

impl AiClient {
    pub fn new(settings: &AiSettings) -> Result<Self, AppError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build AI HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
        })
    }

    pub fn is_configured(&self) -> bool {
        !self.base_url.is_empty() && !self.api_key.is_empty()
    }

    /// Free-form travel advice for a mood and a list of places.
    pub async fn recommend(&self, mood: &str, places_list: &str) -> Result<String, AppError> {
        let prompt = format!(
            "I am in a {} mood. Here are places I am considering:\n{}\n\
             Recommend which to visit and why, in a few short paragraphs.",
            mood, places_list
        );

        let reply = self
            .complete("You are a friendly, concise travel advisor.", &prompt)
            .await?;
        Ok(reply)
    }

    /// Day-by-day plan parsed from the model's JSON answer.
    pub async fn generate_itinerary(&self, request: &ItineraryPrompt) -> Result<Vec<DayPlan>, AppError> {
        let reply = self
            .complete(
                "You are a travel planner. Answer with JSON only, no prose.",
                &itinerary_prompt(request),
            )
            .await?;

        Ok(parse_plan(&reply)?)
    }

    async fn complete(&self, system: &str, user: &str) -> Result<String, UpstreamError> {
        if !self.is_configured() {
            return Err(UpstreamError::NotConfigured(SERVICE));
        }

        let url = format!("{}/chat/completions", self.base_url);
        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage { role: "system", content: system },
                ChatMessage { role: "user", content: user },
            ],
            temperature: 0.7,
        };

        let response: ChatResponse = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to reach AI service: {}", e);
                UpstreamError::Request(e.to_string())
            })?
            .error_for_status()
            .map_err(|e| {
                tracing::error!("AI service returned error: {}", e);
                UpstreamError::Request(e.to_string())
            })?
            .json()
            .await
            .map_err(|e| UpstreamError::InvalidResponse(e.to_string()))?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| UpstreamError::InvalidResponse("empty completion".to_string()))
    }
}

fn itinerary_prompt(request: &ItineraryPrompt) -> String {
    let places_hint = if request.include_pois {
        "List the main places for each day with their latitude and longitude."
    } else {
        "Leave the places list empty."
    };

    format!(
        "Plan a {days}-day {kind} trip to {destination} for someone in a {mood} mood \
         with a {budget} budget. {places_hint} \
         Reply with a JSON array only, one element per day, shaped like \
         {{\"day\": 1, \"summary\": \"...\", \"places\": [{{\"name\": \"...\", \"lat\": 0.0, \"lng\": 0.0}}]}}.",
        days = request.days,
        kind = request.travel_type,
        destination = request.destination,
        mood = request.mood,
        budget = request.budget,
        places_hint = places_hint,
    )
}

/// Accepts a bare array or `{"plan": [...]}`, optionally inside a markdown code fence.
pub fn parse_plan(reply: &str) -> Result<Vec<DayPlan>, UpstreamError> {
    let body = strip_code_fence(reply);

    let days = match serde_json::from_str::<PlanEnvelope>(body) {
        Ok(PlanEnvelope::Days(days)) | Ok(PlanEnvelope::Wrapped { plan: days }) => days,
        Err(e) => return Err(UpstreamError::InvalidResponse(format!("itinerary is not valid JSON: {}", e))),
    };

    if days.is_empty() {
        return Err(UpstreamError::InvalidResponse("itinerary has no days".to_string()));
    }
    Ok(days)
}

fn strip_code_fence(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (`json`) on the opening line
    let rest = rest.split_once('\n').map_or("", |(_, body)| body);
    rest.trim_end().trim_end_matches("```").trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{bearer_token, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings(base_url: &str) -> AiSettings {
        AiSettings {
            base_url: base_url.to_string(),
            api_key: "test-key".to_string(),
            model: "test-model".to_string(),
            timeout_seconds: 5,
        }
    }

    fn completion(content: &str) -> serde_json::Value {
        json!({ "choices": [{ "message": { "role": "assistant", "content": content } }] })
    }

    fn prompt() -> ItineraryPrompt {
        ItineraryPrompt {
            destination: "Pune".to_string(),
            days: 2,
            travel_type: "cultural".to_string(),
            budget: "medium".to_string(),
            mood: "relaxed".to_string(),
            include_pois: true,
        }
    }

    #[test]
    fn test_parse_bare_array() {
        let days = parse_plan(r#"[{"day":1,"summary":"Forts","places":[{"name":"Shaniwar Wada","lat":18.51,"lng":73.85}]}]"#)
            .unwrap();
        assert_eq!(days.len(), 1);
        assert_eq!(days[0].places[0].name, "Shaniwar Wada");
    }

    #[test]
    fn test_parse_fenced_and_wrapped() {
        let reply = "```json\n{\"plan\": [{\"day\": 1, \"summary\": \"Walk\"}]}\n```";
        let days = parse_plan(reply).unwrap();
        assert_eq!(days[0].summary, "Walk");
        assert!(days[0].places.is_empty());
    }

    #[test]
    fn test_parse_rejects_prose_and_empty() {
        assert!(parse_plan("Sure! Day 1: visit the fort.").is_err());
        assert!(parse_plan("[]").is_err());
    }

    #[test]
    fn test_prompt_mentions_request() {
        let text = itinerary_prompt(&prompt());
        assert!(text.contains("2-day cultural trip to Pune"));
        assert!(text.contains("latitude"));
    }

    #[tokio::test]
    async fn test_recommend_returns_completion() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(bearer_token("test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("  Visit the lake.  ")))
            .expect(1)
            .mount(&server)
            .await;

        let client = AiClient::new(&settings(&server.uri())).unwrap();
        let advice = client.recommend("calm", "Lake, Fort").await.unwrap();

        assert_eq!(advice, "Visit the lake.");
    }

    #[tokio::test]
    async fn test_generate_itinerary_parses_plan() {
        let server = MockServer::start().await;
        let plan = r#"[{"day":1,"summary":"Old city","places":[]},{"day":2,"summary":"Hills","places":[]}]"#;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion(plan)))
            .mount(&server)
            .await;

        let client = AiClient::new(&settings(&server.uri())).unwrap();
        let days = client.generate_itinerary(&prompt()).await.unwrap();

        assert_eq!(days.len(), 2);
        assert_eq!(days[1].summary, "Hills");
    }

    #[tokio::test]
    async fn test_upstream_failure_is_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = AiClient::new(&settings(&server.uri())).unwrap();
        let err = client.recommend("calm", "Lake").await.unwrap_err();

        assert!(matches!(err, AppError::Upstream(UpstreamError::Request(_))));
    }

    #[tokio::test]
    async fn test_missing_api_key_is_not_configured() {
        let mut settings = settings("http://127.0.0.1:9");
        settings.api_key = String::new();

        let client = AiClient::new(&settings).unwrap();
        let err = client.recommend("calm", "Lake").await.unwrap_err();

        assert!(matches!(err, AppError::Upstream(UpstreamError::NotConfigured(_))));
    }
}
