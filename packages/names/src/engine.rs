//! First-match-wins orchestration of the strategy chain.

use paysplit_document_models::{NameCandidate, PositionedTextRun};

use crate::NameError;
use crate::layout::{DEFAULT_LINE_TOLERANCE, LineGrouping, reading_order};
use crate::patterns::Denylist;
use crate::profile::DocumentProfile;
use crate::strategy::{PageText, Strategy, StrategyConfig};

/// An ordered, compiled strategy chain plus the layout rules used to put
/// raw runs into reading order.
#[derive(Debug, Clone)]
pub struct NameEngine {
    strategies: Vec<Strategy>,
    line_tolerance: f64,
    line_grouping: LineGrouping,
}

impl NameEngine {
    /// Compiles `configs` in order against `denylist`.
    ///
    /// # Errors
    ///
    /// Returns [`NameError`] if any strategy fails to compile.
    pub fn new<'a, I>(configs: I, denylist: &Denylist) -> Result<Self, NameError>
    where
        I: IntoIterator<Item = &'a StrategyConfig>,
    {
        let strategies = configs
            .into_iter()
            .map(|config| config.compile(denylist))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            strategies,
            line_tolerance: DEFAULT_LINE_TOLERANCE,
            line_grouping: LineGrouping::default(),
        })
    }

    /// Builds the engine described by a profile, including its layout
    /// parameters.
    ///
    /// # Errors
    ///
    /// Returns [`NameError`] if any strategy fails to compile.
    pub fn from_profile(profile: &DocumentProfile) -> Result<Self, NameError> {
        let denylist = Denylist::new(&profile.denylist);
        Ok(Self::new(&profile.strategies, &denylist)?
            .with_layout(profile.line_tolerance, profile.line_grouping))
    }

    #[must_use]
    pub const fn with_layout(mut self, line_tolerance: f64, line_grouping: LineGrouping) -> Self {
        self.line_tolerance = line_tolerance;
        self.line_grouping = line_grouping;
        self
    }

    #[must_use]
    pub fn strategies(&self) -> &[Strategy] {
        &self.strategies
    }

    /// Runs the chain over runs that are already in reading order.
    ///
    /// The first strategy to propose a name wins; later strategies are not
    /// consulted. `strategy_rank` is the zero-based position of the winner.
    #[must_use]
    pub fn extract(&self, runs: &[PositionedTextRun]) -> Option<NameCandidate> {
        let page = PageText::new(runs);

        self.strategies
            .iter()
            .enumerate()
            .find_map(|(rank, strategy)| {
                strategy.apply(&page).map(|value| NameCandidate {
                    value,
                    strategy_rank: rank,
                    strategy: strategy.kind(),
                })
            })
            .inspect(|candidate| {
                log::debug!(
                    "Name {} found by {} (rank {})",
                    candidate.value,
                    candidate.strategy,
                    candidate.strategy_rank
                );
            })
    }

    /// Puts raw runs into reading order with the engine's layout rules,
    /// then runs the chain.
    #[must_use]
    pub fn extract_unordered(&self, runs: &[PositionedTextRun]) -> Option<NameCandidate> {
        let ordered = reading_order(runs, self.line_tolerance, self.line_grouping);
        log::trace!(
            "Reading order: {:?}",
            ordered.iter().map(|r| r.text.as_str()).collect::<Vec<_>>()
        );
        self.extract(&ordered)
    }
}

#[cfg(test)]
mod tests {
    use paysplit_document_models::StrategyKind;

    use super::*;
    use crate::profile::find_profile;

    fn run(text: &str, x: f64, y: f64) -> PositionedTextRun {
        PositionedTextRun::new(text, x, y)
    }

    fn recibo() -> NameEngine {
        NameEngine::from_profile(find_profile("recibo").unwrap()).unwrap()
    }

    fn contracheque() -> NameEngine {
        NameEngine::from_profile(find_profile("contracheque").unwrap()).unwrap()
    }

    #[test]
    fn labeled_field_wins_on_receipt() {
        let runs = vec![
            run("RECIBO DE PAGAMENTO", 100.0, 820.0),
            run("Favorecido/Banco/Ag/Conta:", 10.0, 800.0),
            run("MARIA DOS SANTOS", 200.0, 800.0),
            run("- 1234", 400.0, 800.0),
        ];
        let candidate = recibo().extract_unordered(&runs).unwrap();
        assert_eq!(candidate.value, "MARIA_DOS_SANTOS");
        assert_eq!(candidate.strategy, StrategyKind::LabeledField);
        assert_eq!(candidate.strategy_rank, 0);
    }

    #[test]
    fn earlier_strategy_wins_when_several_match() {
        // The greedy scan alone would pick "PEDRO HENRIQUE" from the header
        // line, but the labeled field comes first in the chain.
        let runs = vec![
            run("PEDRO", 10.0, 820.0),
            run("HENRIQUE", 60.0, 820.0),
            run("Favorecido/Banco/Ag/Conta:", 10.0, 800.0),
            run("ANA LUIZA FARIAS", 200.0, 800.0),
        ];
        let candidate = recibo().extract_unordered(&runs).unwrap();
        assert_eq!(candidate.value, "ANA_LUIZA_FARIAS");
        assert_eq!(candidate.strategy_rank, 0);
    }

    #[test]
    fn receipt_falls_through_to_greedy() {
        let runs = vec![
            run("RECIBO", 10.0, 820.0),
            run("BEATRIZ", 10.0, 700.0),
            run("MOURA", 70.0, 700.0),
            run("Valor", 10.0, 600.0),
        ];
        let candidate = recibo().extract_unordered(&runs).unwrap();
        assert_eq!(candidate.value, "BEATRIZ_MOURA");
        assert_eq!(candidate.strategy, StrategyKind::Greedy);
        assert_eq!(candidate.strategy_rank, 2);
    }

    #[test]
    fn paycheck_prefers_code_prefixed_name() {
        let runs = vec![
            run("CASA DE SAÚDE MENINO JESUS DE PRAGA", 100.0, 820.0),
            run("Código", 10.0, 780.0),
            run("Nome do Funcionário", 60.0, 780.0),
            run("381", 10.0, 765.0),
            run("JOAO", 60.0, 765.0),
            run("SILVA", 100.0, 765.0),
            run("TÉCNICO", 200.0, 765.0),
            run("322205", 300.0, 765.0),
        ];
        let candidate = contracheque().extract_unordered(&runs).unwrap();
        assert_eq!(candidate.value, "JOAO_SILVA");
        assert_eq!(candidate.strategy, StrategyKind::CodePrefixed);
    }

    #[test]
    fn paycheck_anchor_keeps_names_overlapping_the_denylist() {
        // "CASA" is denied for the header, but it is part of this surname.
        let runs = vec![
            run("Nome do Funcionário", 10.0, 780.0),
            run("JOAO CASAGRANDE", 10.0, 765.0),
        ];
        let candidate = contracheque().extract_unordered(&runs).unwrap();
        assert_eq!(candidate.value, "JOAO_CASAGRANDE");
        assert_eq!(candidate.strategy, StrategyKind::AnchorScan);
        assert_eq!(candidate.strategy_rank, 1);
    }

    #[test]
    fn no_strategy_matches() {
        let runs = vec![run("Total", 10.0, 700.0), run("1.234,56", 100.0, 700.0)];
        assert!(recibo().extract_unordered(&runs).is_none());
        assert!(contracheque().extract_unordered(&runs).is_none());
        assert!(recibo().extract(&[]).is_none());
    }

    #[test]
    fn engine_from_explicit_configs() {
        let configs = vec![StrategyConfig::Standalone { min_len: 10 }];
        let engine = NameEngine::new(&configs, &Denylist::new(["CNPJ"])).unwrap();
        assert_eq!(engine.strategies().len(), 1);

        let runs = vec![run("CNPJ DA EMPRESA", 0.0, 0.0), run("LAURA MENDES", 0.0, 0.0)];
        let candidate = engine.extract(&runs).unwrap();
        assert_eq!(candidate.value, "LAURA_MENDES");
        assert_eq!(candidate.strategy, StrategyKind::Standalone);
    }
}
