//! Independent name-matching strategies.
//!
//! Each strategy looks at one page's runs in reading order (and, for the
//! regex strategies, at the runs joined with single spaces) and either
//! proposes a normalised name or declines. Strategies never fail: a page
//! without a recognisable name is simply declined.
//!
//! [`StrategyConfig`] is the serialisable form found in profile TOML;
//! [`Strategy`] is the compiled form the engine runs.

use std::cell::OnceCell;

use paysplit_document_models::{PositionedTextRun, StrategyKind};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::NameError;
use crate::layout::joined_text;
use crate::patterns::{
    Denylist, UPPERCASE_LETTERS, char_len, exact_digits, long_number, normalize_name,
    uppercase_phrase, uppercase_word,
};

const fn default_anchor_window() -> usize {
    10
}

const fn default_code_digits() -> usize {
    3
}

const fn default_stop_digits() -> usize {
    5
}

const fn default_code_min_len() -> usize {
    5
}

const fn default_anchor_min_len() -> usize {
    5
}

const fn default_standalone_min_len() -> usize {
    10
}

/// Minimum length of the word that opens a greedy name.
const GREEDY_FIRST_WORD_MIN: usize = 3;

/// Minimum length of every following name word.
const NAME_WORD_MIN: usize = 2;

/// Serialisable strategy definition, tagged by `type` in TOML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StrategyConfig {
    /// A label phrase in the joined text, immediately followed by the
    /// uppercase name and then a `- <digit>` sequence or the end of text.
    LabeledField {
        /// Regex for the label, matched case-insensitively (e.g.
        /// `Favorecido\s*/?\s*Banco\s*/?\s*Ag\s*/?\s*Conta\s*:`).
        label: String,
    },

    /// Finds the first run containing every anchor term, then scans the
    /// runs after it for a full uppercase name.
    AnchorScan {
        /// Terms the anchor run must contain, compared case-insensitively.
        anchor: Vec<String>,
        /// Runs at offsets `1..window` after the anchor are inspected.
        #[serde(default = "default_anchor_window")]
        window: usize,
        /// Minimum length of the candidate run.
        #[serde(default = "default_anchor_min_len")]
        min_len: usize,
        /// Substrings that disqualify a candidate. Falls back to the
        /// profile denylist when absent.
        #[serde(default)]
        exclude: Option<Vec<String>>,
    },

    /// A run of exactly `code_digits` digits followed by uppercase words,
    /// up to a run of at least `stop_digits` digits.
    CodePrefixed {
        #[serde(default = "default_code_digits")]
        code_digits: usize,
        #[serde(default = "default_stop_digits")]
        stop_digits: usize,
        /// Minimum length of the assembled name.
        #[serde(default = "default_code_min_len")]
        min_len: usize,
    },

    /// Glues consecutive uppercase words together, starting at any word
    /// of three or more letters.
    Greedy {
        /// Runs at offsets `1..window` after the first word are inspected.
        window: usize,
        /// Minimum length of the assembled name (which must also contain
        /// at least one space).
        min_len: usize,
        /// When set, followers must sit within this vertical distance of
        /// the first word.
        #[serde(default)]
        line_tolerance: Option<f64>,
    },

    /// A single run that already is a full uppercase name.
    Standalone {
        #[serde(default = "default_standalone_min_len")]
        min_len: usize,
    },

    /// `<code> <NAME> <number>` anywhere in the joined text.
    FullTextRegex {
        #[serde(default = "default_code_digits")]
        code_digits: usize,
        #[serde(default = "default_stop_digits")]
        stop_digits: usize,
    },
}

impl StrategyConfig {
    #[must_use]
    pub const fn kind(&self) -> StrategyKind {
        match self {
            Self::LabeledField { .. } => StrategyKind::LabeledField,
            Self::AnchorScan { .. } => StrategyKind::AnchorScan,
            Self::CodePrefixed { .. } => StrategyKind::CodePrefixed,
            Self::Greedy { .. } => StrategyKind::Greedy,
            Self::Standalone { .. } => StrategyKind::Standalone,
            Self::FullTextRegex { .. } => StrategyKind::FullTextRegex,
        }
    }

    /// Compiles the definition against the profile denylist.
    ///
    /// # Errors
    ///
    /// Returns [`NameError::Regex`] if a configured or derived pattern
    /// fails to compile, or [`NameError::Profile`] for unusable
    /// parameters.
    pub fn compile(&self, denylist: &Denylist) -> Result<Strategy, NameError> {
        Ok(match self {
            Self::LabeledField { label } => {
                if label.trim().is_empty() {
                    return Err(NameError::Profile(
                        "labeled_field strategy needs a non-empty label".to_owned(),
                    ));
                }
                Strategy::LabeledField {
                    pattern: Regex::new(&format!(
                        r"(?i:{label})\s*([{UPPERCASE_LETTERS}\s]+?)(?:\s*-\s*[0-9]|$)"
                    ))?,
                }
            }
            Self::AnchorScan {
                anchor,
                window,
                min_len,
                exclude,
            } => {
                let anchor: Vec<String> = anchor
                    .iter()
                    .map(|t| t.trim().to_lowercase())
                    .filter(|t| !t.is_empty())
                    .collect();
                if anchor.is_empty() {
                    return Err(NameError::Profile(
                        "anchor_scan strategy needs at least one anchor term".to_owned(),
                    ));
                }
                Strategy::AnchorScan {
                    anchor,
                    window: *window,
                    candidate: uppercase_phrase(*min_len)?,
                    exclude: exclude
                        .as_ref()
                        .map_or_else(|| denylist.clone(), Denylist::new),
                }
            }
            Self::CodePrefixed {
                code_digits,
                stop_digits,
                min_len,
            } => Strategy::CodePrefixed {
                code: exact_digits(*code_digits)?,
                stop: long_number(*stop_digits)?,
                word: uppercase_word(NAME_WORD_MIN)?,
                min_len: *min_len,
                denylist: denylist.clone(),
            },
            Self::Greedy {
                window,
                min_len,
                line_tolerance,
            } => Strategy::Greedy {
                first: uppercase_word(GREEDY_FIRST_WORD_MIN)?,
                follower: uppercase_word(NAME_WORD_MIN)?,
                window: *window,
                min_len: *min_len,
                line_tolerance: *line_tolerance,
                denylist: denylist.clone(),
            },
            Self::Standalone { min_len } => Strategy::Standalone {
                line: uppercase_phrase(*min_len)?,
                denylist: denylist.clone(),
            },
            Self::FullTextRegex {
                code_digits,
                stop_digits,
            } => Strategy::FullTextRegex {
                pattern: Regex::new(&format!(
                    r"([0-9]{{{code_digits}}})\s+([{UPPERCASE_LETTERS}\s]+?)\s+([0-9]{{{stop_digits},}})"
                ))?,
            },
        })
    }
}

/// The runs of one page, with the joined text computed on first use.
pub struct PageText<'a> {
    runs: &'a [PositionedTextRun],
    joined: OnceCell<String>,
}

impl<'a> PageText<'a> {
    /// Wraps runs that are already in reading order.
    #[must_use]
    pub const fn new(runs: &'a [PositionedTextRun]) -> Self {
        Self {
            runs,
            joined: OnceCell::new(),
        }
    }

    #[must_use]
    pub const fn runs(&self) -> &'a [PositionedTextRun] {
        self.runs
    }

    /// Run texts joined with single spaces.
    #[must_use]
    pub fn joined(&self) -> &str {
        self.joined.get_or_init(|| joined_text(self.runs))
    }
}

/// A compiled strategy, ready to run.
#[derive(Debug, Clone)]
pub enum Strategy {
    LabeledField {
        pattern: Regex,
    },
    AnchorScan {
        anchor: Vec<String>,
        window: usize,
        candidate: Regex,
        exclude: Denylist,
    },
    CodePrefixed {
        code: Regex,
        stop: Regex,
        word: Regex,
        min_len: usize,
        denylist: Denylist,
    },
    Greedy {
        first: Regex,
        follower: Regex,
        window: usize,
        min_len: usize,
        line_tolerance: Option<f64>,
        denylist: Denylist,
    },
    Standalone {
        line: Regex,
        denylist: Denylist,
    },
    FullTextRegex {
        pattern: Regex,
    },
}

impl Strategy {
    #[must_use]
    pub const fn kind(&self) -> StrategyKind {
        match self {
            Self::LabeledField { .. } => StrategyKind::LabeledField,
            Self::AnchorScan { .. } => StrategyKind::AnchorScan,
            Self::CodePrefixed { .. } => StrategyKind::CodePrefixed,
            Self::Greedy { .. } => StrategyKind::Greedy,
            Self::Standalone { .. } => StrategyKind::Standalone,
            Self::FullTextRegex { .. } => StrategyKind::FullTextRegex,
        }
    }

    /// Proposes a normalised name, or `None` when the page does not match.
    /// Never returns an empty string.
    #[must_use]
    pub fn apply(&self, page: &PageText<'_>) -> Option<String> {
        let raw = match self {
            Self::LabeledField { pattern } => captured(pattern, page.joined(), 1),
            Self::AnchorScan {
                anchor,
                window,
                candidate,
                exclude,
            } => anchor_scan(page.runs(), anchor, *window, candidate, exclude),
            Self::CodePrefixed {
                code,
                stop,
                word,
                min_len,
                denylist,
            } => code_prefixed(page.runs(), code, stop, word, *min_len, denylist),
            Self::Greedy {
                first,
                follower,
                window,
                min_len,
                line_tolerance,
                denylist,
            } => greedy(
                page.runs(),
                &GreedyRules {
                    first,
                    follower,
                    window: *window,
                    min_len: *min_len,
                    line_tolerance: *line_tolerance,
                    denylist,
                },
            ),
            Self::Standalone { line, denylist } => page
                .runs()
                .iter()
                .find(|r| line.is_match(&r.text) && !denylist.occurs_in(&r.text))
                .map(|r| r.text.clone()),
            Self::FullTextRegex { pattern } => captured(pattern, page.joined(), 2),
        }?;

        let name = normalize_name(&raw);
        (!name.is_empty()).then_some(name)
    }
}

fn captured(pattern: &Regex, text: &str, group: usize) -> Option<String> {
    pattern
        .captures(text)
        .and_then(|caps| caps.get(group))
        .map(|m| m.as_str().trim().to_owned())
}

fn anchor_scan(
    runs: &[PositionedTextRun],
    anchor: &[String],
    window: usize,
    candidate: &Regex,
    exclude: &Denylist,
) -> Option<String> {
    let anchor_idx = runs.iter().position(|r| {
        let lower = r.text.to_lowercase();
        anchor.iter().all(|term| lower.contains(term.as_str()))
    })?;

    let end = runs.len().min(anchor_idx + window);
    runs.get(anchor_idx + 1..end)?
        .iter()
        .find(|r| candidate.is_match(&r.text) && !exclude.occurs_in(&r.text))
        .map(|r| r.text.clone())
}

fn code_prefixed(
    runs: &[PositionedTextRun],
    code: &Regex,
    stop: &Regex,
    word: &Regex,
    min_len: usize,
    denylist: &Denylist,
) -> Option<String> {
    let last = runs.len().saturating_sub(1);

    for (i, run) in runs.iter().enumerate().take(last) {
        if !code.is_match(&run.text) {
            continue;
        }
        log::trace!("code_prefixed: code {} at run {i}", run.text);

        let mut words: Vec<&str> = Vec::new();

        for candidate in &runs[i + 1..] {
            let text = candidate.text.as_str();
            if stop.is_match(text) {
                break;
            }
            if word.is_match(text) {
                if !denylist.contains(text) {
                    words.push(text);
                }
            } else if words.is_empty() || text.is_empty() {
                continue;
            } else {
                break;
            }
        }

        let name = words.join(" ");
        if char_len(&name) >= min_len {
            return Some(name);
        }
    }

    None
}

struct GreedyRules<'a> {
    first: &'a Regex,
    follower: &'a Regex,
    window: usize,
    min_len: usize,
    line_tolerance: Option<f64>,
    denylist: &'a Denylist,
}

fn greedy(runs: &[PositionedTextRun], rules: &GreedyRules<'_>) -> Option<String> {
    for (i, run) in runs.iter().enumerate() {
        if !rules.first.is_match(&run.text) || rules.denylist.contains(&run.text) {
            continue;
        }

        let mut name = run.text.clone();
        let end = runs.len().min(i + rules.window);

        for next in runs.get(i + 1..end).unwrap_or_default() {
            let same_line = rules
                .line_tolerance
                .is_none_or(|tolerance| (run.y - next.y).abs() < tolerance);

            if same_line
                && rules.follower.is_match(&next.text)
                && !rules.denylist.contains(&next.text)
            {
                name.push(' ');
                name.push_str(&next.text);
            } else if same_line && next.text.is_empty() {
                continue;
            } else {
                break;
            }
        }

        if name.contains(' ') && char_len(&name) >= rules.min_len {
            return Some(name);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(text: &str, x: f64, y: f64) -> PositionedTextRun {
        PositionedTextRun::new(text, x, y)
    }

    fn apply(config: &StrategyConfig, deny: &[&str], runs: &[PositionedTextRun]) -> Option<String> {
        let strategy = config.compile(&Denylist::new(deny)).unwrap();
        strategy.apply(&PageText::new(runs))
    }

    fn labeled() -> StrategyConfig {
        StrategyConfig::LabeledField {
            label: r"Favorecido\s*/?\s*Banco\s*/?\s*Ag\s*/?\s*Conta\s*:".to_owned(),
        }
    }

    #[test]
    fn labeled_field_stops_at_dash_digit() {
        let runs = vec![
            run("Favorecido/Banco/Ag/Conta:", 10.0, 800.0),
            run("MARIA DOS SANTOS", 200.0, 800.0),
            run("- 1234", 400.0, 800.0),
        ];
        assert_eq!(
            apply(&labeled(), &[], &runs),
            Some("MARIA_DOS_SANTOS".to_owned())
        );
    }

    #[test]
    fn labeled_field_accepts_spaced_label_and_end_of_text() {
        let runs = vec![
            run("FAVORECIDO / BANCO / AG / CONTA :", 10.0, 800.0),
            run("JOSÉ DA CONCEIÇÃO", 200.0, 800.0),
        ];
        assert_eq!(
            apply(&labeled(), &[], &runs),
            Some("JOSÉ_DA_CONCEIÇÃO".to_owned())
        );
    }

    #[test]
    fn labeled_field_declines_without_label() {
        let runs = vec![run("MARIA DOS SANTOS", 200.0, 800.0), run("- 1", 0.0, 0.0)];
        assert_eq!(apply(&labeled(), &[], &runs), None);
    }

    #[test]
    fn anchor_scan_skips_excluded_candidates() {
        let config = StrategyConfig::AnchorScan {
            anchor: vec!["favorecido".to_owned()],
            window: 10,
            min_len: 5,
            exclude: Some(vec!["CASA".to_owned(), "BANCO".to_owned()]),
        };
        let runs = vec![
            run("Favorecido", 10.0, 700.0),
            run("BANCO DO BRASIL", 100.0, 700.0),
            run("001", 200.0, 700.0),
            run("ANA PAULA LIMA", 10.0, 680.0),
        ];
        assert_eq!(
            apply(&config, &[], &runs),
            Some("ANA_PAULA_LIMA".to_owned())
        );
    }

    #[test]
    fn anchor_scan_window_is_exclusive() {
        let config = StrategyConfig::AnchorScan {
            anchor: vec!["nome".to_owned(), "funcionário".to_owned()],
            window: 2,
            min_len: 5,
            exclude: Some(Vec::new()),
        };
        let far = vec![
            run("Nome do Funcionário", 10.0, 700.0),
            run("Cargo", 10.0, 690.0),
            run("PEDRO ALVES", 10.0, 680.0),
        ];
        assert_eq!(apply(&config, &[], &far), None);

        let near = vec![
            run("NOME DO FUNCIONÁRIO", 10.0, 700.0),
            run("PEDRO ALVES", 10.0, 680.0),
        ];
        assert_eq!(apply(&config, &[], &near), Some("PEDRO_ALVES".to_owned()));
    }

    #[test]
    fn anchor_scan_uses_profile_denylist_by_default() {
        let config = StrategyConfig::AnchorScan {
            anchor: vec!["favorecido".to_owned()],
            window: 10,
            min_len: 5,
            exclude: None,
        };
        let runs = vec![run("favorecido", 0.0, 0.0), run("RECIBO GERAL", 0.0, 0.0)];
        assert_eq!(apply(&config, &["RECIBO"], &runs), None);
        assert_eq!(apply(&config, &[], &runs), Some("RECIBO_GERAL".to_owned()));
    }

    #[test]
    fn code_prefixed_concatenates_until_long_number() {
        let config = StrategyConfig::CodePrefixed {
            code_digits: 3,
            stop_digits: 5,
            min_len: 5,
        };
        let runs = vec![
            run("Código", 10.0, 700.0),
            run("381", 10.0, 690.0),
            run("JOAO", 50.0, 690.0),
            run("", 80.0, 690.0),
            run("DA", 90.0, 690.0),
            run("SILVA", 110.0, 690.0),
            run("TÉCNICO", 200.0, 690.0),
            run("322205", 300.0, 690.0),
            run("OUTRO", 400.0, 690.0),
        ];
        assert_eq!(
            apply(&config, &["TÉCNICO"], &runs),
            Some("JOAO_DA_SILVA".to_owned())
        );
    }

    #[test]
    fn code_prefixed_breaks_on_non_name_token_once_started() {
        let config = StrategyConfig::CodePrefixed {
            code_digits: 3,
            stop_digits: 5,
            min_len: 5,
        };
        let runs = vec![
            run("381", 10.0, 690.0),
            run("Nome:", 30.0, 690.0),
            run("LUCAS", 50.0, 690.0),
            run("Mendes", 90.0, 690.0),
            run("PEREIRA", 110.0, 690.0),
        ];
        assert_eq!(apply(&config, &[], &runs), Some("LUCAS".to_owned()));
    }

    #[test]
    fn code_prefixed_requires_minimum_length() {
        let config = StrategyConfig::CodePrefixed {
            code_digits: 3,
            stop_digits: 5,
            min_len: 5,
        };
        let runs = vec![run("381", 0.0, 0.0), run("ANA", 0.0, 0.0), run("12345", 0.0, 0.0)];
        assert_eq!(apply(&config, &[], &runs), None);
    }

    #[test]
    fn greedy_respects_line_tolerance() {
        let config = StrategyConfig::Greedy {
            window: 5,
            min_len: 8,
            line_tolerance: Some(10.0),
        };
        let runs = vec![
            run("RECIBO", 10.0, 800.0),
            run("CARLOS", 10.0, 700.0),
            run("EDUARDO", 60.0, 700.0),
            run("", 100.0, 700.0),
            run("NUNES", 120.0, 702.0),
            run("ROCHA", 10.0, 650.0),
        ];
        assert_eq!(
            apply(&config, &["RECIBO"], &runs),
            Some("CARLOS_EDUARDO_NUNES".to_owned())
        );
    }

    #[test]
    fn greedy_window_bounds_followers() {
        let config = StrategyConfig::Greedy {
            window: 3,
            min_len: 8,
            line_tolerance: None,
        };
        let runs = vec![
            run("ANA", 0.0, 0.0),
            run("BEATRIZ", 0.0, 0.0),
            run("COSTA", 0.0, 0.0),
            run("DIAS", 0.0, 0.0),
        ];
        assert_eq!(apply(&config, &[], &runs), Some("ANA_BEATRIZ_COSTA".to_owned()));
    }

    #[test]
    fn greedy_needs_two_words() {
        let config = StrategyConfig::Greedy {
            window: 10,
            min_len: 10,
            line_tolerance: None,
        };
        let runs = vec![run("ADMINISTRATIVO", 0.0, 0.0), run("123", 0.0, 0.0)];
        assert_eq!(apply(&config, &[], &runs), None);
    }

    #[test]
    fn standalone_rejects_denylisted_substrings() {
        let config = StrategyConfig::Standalone { min_len: 10 };
        let runs = vec![
            run("CASA DE SAUDE MENINO JESUS", 0.0, 800.0),
            run("FERNANDA OLIVEIRA", 0.0, 700.0),
        ];
        assert_eq!(
            apply(&config, &["CASA", "MENINO"], &runs),
            Some("FERNANDA_OLIVEIRA".to_owned())
        );
    }

    #[test]
    fn full_text_regex_captures_middle_group() {
        let config = StrategyConfig::FullTextRegex {
            code_digits: 3,
            stop_digits: 5,
        };
        let runs = vec![
            run("Func.", 0.0, 0.0),
            run("381 RAFAEL", 0.0, 0.0),
            run("GOMES 322205", 0.0, 0.0),
        ];
        assert_eq!(apply(&config, &[], &runs), Some("RAFAEL_GOMES".to_owned()));
    }

    #[test]
    fn empty_labeled_field_is_rejected() {
        let config = StrategyConfig::LabeledField {
            label: "  ".to_owned(),
        };
        assert!(matches!(
            config.compile(&Denylist::default()),
            Err(NameError::Profile(_))
        ));
    }

    #[test]
    fn parses_tagged_toml() {
        let config: StrategyConfig =
            toml::de::from_str("type = \"greedy\"\nwindow = 5\nmin_len = 8\nline_tolerance = 10.0")
                .unwrap();
        assert_eq!(
            config,
            StrategyConfig::Greedy {
                window: 5,
                min_len: 8,
                line_tolerance: Some(10.0),
            }
        );
        assert_eq!(config.kind(), StrategyKind::Greedy);

        let standalone: StrategyConfig = toml::de::from_str("type = \"standalone\"").unwrap();
        assert_eq!(standalone, StrategyConfig::Standalone { min_len: 10 });
    }
}
