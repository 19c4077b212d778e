use anyhow::{Context, Result, bail};
use std::collections::HashSet;

use elevator_game::derive_stream_seed;

pub const DEFAULT_SEED: u64 = 1337;
const PHRASE_DOMAIN_SEED: u64 = 0x454C_4556;

/// Seed plus the token it was resolved from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedInfo {
    pub seed: u64,
    /// Original phrase for seeds derived from words.
    pub phrase: Option<String>,
}

impl SeedInfo {
    #[must_use]
    pub const fn from_numeric(seed: u64) -> Self {
        Self { seed, phrase: None }
    }

    #[must_use]
    pub fn from_phrase(phrase: &str) -> Self {
        let normalized = phrase.to_lowercase();
        Self {
            seed: derive_stream_seed(PHRASE_DOMAIN_SEED, normalized.as_bytes()),
            phrase: Some(normalized),
        }
    }

    #[must_use]
    pub fn label(&self) -> String {
        match &self.phrase {
            Some(phrase) => format!("{phrase} ({})", self.seed),
            None => self.seed.to_string(),
        }
    }
}

/// Resolve CLI seed tokens into canonical seeds.
///
/// Accepts decimal integers (negative values use their magnitude),
/// `0x`-prefixed hex, and `phrase:<words>` tokens hashed into a seed.
/// Duplicates are dropped keeping first occurrence; no tokens means
/// [`DEFAULT_SEED`].
pub fn resolve_seed_inputs(tokens: &[String]) -> Result<Vec<SeedInfo>> {
    let mut pending: Vec<SeedInfo> = Vec::new();

    for token in tokens {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }

        if let Ok(value) = token.parse::<i64>() {
            pending.push(SeedInfo::from_numeric(value.unsigned_abs()));
            continue;
        }

        if let Ok(value) = token.parse::<u64>() {
            pending.push(SeedInfo::from_numeric(value));
            continue;
        }

        if let Some(hex) = token
            .strip_prefix("0x")
            .or_else(|| token.strip_prefix("0X"))
        {
            let value = u64::from_str_radix(hex, 16)
                .with_context(|| format!("invalid hex seed: {token}"))?;
            pending.push(SeedInfo::from_numeric(value));
            continue;
        }

        if let Some(phrase) = token.strip_prefix("phrase:")
            && !phrase.is_empty()
        {
            pending.push(SeedInfo::from_phrase(phrase));
            continue;
        }

        bail!("Unrecognized seed token: {token}");
    }

    let mut seen = HashSet::new();
    pending.retain(|info| seen.insert(info.seed));

    if pending.is_empty() {
        pending.push(SeedInfo::from_numeric(DEFAULT_SEED));
    }

    Ok(pending)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(raw: &[&str]) -> Vec<String> {
        raw.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn resolves_numeric_hex_and_phrase() {
        let seeds = resolve_seed_inputs(&tokens(&["42", "-7", "0xFF", "phrase:Lobby"])).unwrap();
        let values: Vec<u64> = seeds.iter().map(|s| s.seed).collect();
        assert_eq!(&values[..3], &[42, 7, 255]);
        assert_eq!(seeds[3].phrase.as_deref(), Some("lobby"));
        assert_eq!(seeds[3], SeedInfo::from_phrase("LOBBY"));
    }

    #[test]
    fn duplicates_are_dropped_in_order() {
        let seeds = resolve_seed_inputs(&tokens(&["5", "0x5", "-5", "6"])).unwrap();
        assert_eq!(seeds, vec![SeedInfo::from_numeric(5), SeedInfo::from_numeric(6)]);
    }

    #[test]
    fn empty_input_falls_back_to_default() {
        let seeds = resolve_seed_inputs(&tokens(&["", "  "])).unwrap();
        assert_eq!(seeds, vec![SeedInfo::from_numeric(DEFAULT_SEED)]);
    }

    #[test]
    fn rejects_unknown_tokens() {
        assert!(resolve_seed_inputs(&tokens(&["elevator"])).is_err());
        assert!(resolve_seed_inputs(&tokens(&["0xZZ"])).is_err());
        assert!(resolve_seed_inputs(&tokens(&["phrase:"])).is_err());
    }
}
