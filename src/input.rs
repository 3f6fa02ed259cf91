//! Classify the card argument of `kaiten download`: either a bare numeric
//! card id (which relies on a configured API base URL) or a card URL the
//! API base can be derived from.

use anyhow::{bail, Context, Result};
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardInput {
    pub card_id: i64,
    /// API base derived from a card URL; `None` for bare numeric input.
    pub api_base: Option<String>,
}

/// Parse the input and resolve the API base URL, preferring one derived from
/// the input itself over the configured one. Fails before any network call.
pub fn resolve_card_input(input: &str, configured_base: Option<&str>) -> Result<(i64, String)> {
    let parsed = parse_card_input(input)?;
    let base = match parsed.api_base {
        Some(base) => base,
        None => configured_base
            .map(String::from)
            .context("a bare card id needs a configured API base URL; set KAITEN_API_BASE_URL or pass the full card URL")?,
    };
    Ok((parsed.card_id, base))
}

pub fn parse_card_input(input: &str) -> Result<CardInput> {
    let input = input.trim();
    if input.is_empty() {
        bail!("card argument is empty; expected a card id or a card URL");
    }

    if let Ok(card_id) = input.parse::<i64>() {
        return Ok(CardInput {
            card_id,
            api_base: None,
        });
    }

    let url = Url::parse(input)
        .with_context(|| format!("'{input}' is neither a numeric card id nor a valid URL"))?;
    let host = url
        .host_str()
        .with_context(|| format!("card URL '{input}' has no host"))?;
    let api_base = match url.port() {
        Some(port) => format!("{}://{host}:{port}/api/v1", url.scheme()),
        None => format!("{}://{host}/api/v1", url.scheme()),
    };

    let segments: Vec<&str> = url
        .path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).collect())
        .unwrap_or_default();

    // Board URL: .../space/<id>/boards/card/<cardId>
    if let Some(pos) = segments.iter().position(|s| *s == "card") {
        if pos >= 1 && segments[pos - 1] == "boards" {
            let raw = segments.get(pos + 1).with_context(|| {
                format!("card URL '{input}' is missing the card id after /boards/card/")
            })?;
            let card_id = raw
                .parse::<i64>()
                .with_context(|| format!("'{raw}' in card URL '{input}' is not a numeric id"))?;
            return Ok(CardInput {
                card_id,
                api_base: Some(api_base),
            });
        }
    }

    // Short URL: <host>/<cardId>
    if let [raw] = segments.as_slice() {
        let card_id = raw
            .parse::<i64>()
            .with_context(|| format!("'{raw}' in card URL '{input}' is not a numeric id"))?;
        return Ok(CardInput {
            card_id,
            api_base: Some(api_base),
        });
    }

    bail!(
        "unrecognized card URL shape '{input}'; expected .../space/<id>/boards/card/<id> or <host>/<id>"
    );
}
