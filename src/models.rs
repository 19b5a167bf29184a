use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub const DEFAULT_TYPE: &str = "default";
pub const PITCH_TYPE: &str = "pitch";
pub const DEFAULT_SLIDES: u32 = 10;

pub const JUDGE_INSTRUCTION: &str =
    "You are an expert Hackathon judge. Give your answer in a short description only.";

// The panel sends counts either as numbers or as numeric strings. Anything
// else is treated as if the field were missing.
fn lenient_count<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let count = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    };
    Ok(count)
}

// Text endpoint request format. Every field is optional on the wire.
#[derive(Deserialize, Serialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct GeminiRequest {
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub slides: Option<u32>,
    #[serde(default)]
    pub system_instruction: Option<String>,
}

impl GeminiRequest {
    pub fn prompt(&self) -> &str {
        self.prompt.as_deref().unwrap_or_default()
    }

    // Blank type falls back to "default"
    pub fn kind(&self) -> &str {
        match self.kind.as_deref() {
            Some(kind) if !kind.is_empty() => kind,
            _ => DEFAULT_TYPE,
        }
    }

    // Zero slides counts as unset
    pub fn slides(&self) -> u32 {
        match self.slides {
            Some(slides) if slides > 0 => slides,
            _ => DEFAULT_SLIDES,
        }
    }

    /// System instruction sent to the model. The pitch type always uses the
    /// slide deck template, otherwise an explicit instruction wins over the
    /// judge persona.
    pub fn system_instruction(&self) -> String {
        if self.kind() == PITCH_TYPE {
            return pitch_instruction(self.slides());
        }
        match self.system_instruction.as_deref() {
            Some(instruction) if !instruction.is_empty() => instruction.to_string(),
            _ => JUDGE_INSTRUCTION.to_string(),
        }
    }
}

pub fn pitch_instruction(slides: u32) -> String {
    format!(
        "You are an expert in 10-20-30 Guy Kawasaki pitch slides. Based on the hackathon topic \
         given give your answer in the JSON format in slide array which has (name, content, image, \
         link). Give only final output. Suggest a image keyword for the slide. Have {slides} \
         slides. Please give any link reference if there is evidence. Do not mention 'Slide'. Do \
         not give other suggestion or explaination."
    )
}

// Photo endpoint request format
#[derive(Deserialize, Serialize, Clone, Debug, Default)]
pub struct PexelRequest {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub items: Option<u32>,
}

impl PexelRequest {
    pub fn query(&self) -> &str {
        self.query.as_deref().unwrap_or_default()
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct GeminiResponse {
    pub result: String,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct PexelResponse {
    pub result: Value,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
}
