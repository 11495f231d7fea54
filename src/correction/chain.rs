//! Word stage then sentence stage.

use crate::correction::corrector::Corrector;
use crate::correction::words::split_words;
use crate::error::Result;

/// Runs correctors in order, each on the previous one's output.
///
/// The input is whitespace-normalized first. An empty intermediate result
/// stops the chain and the last non-empty text is kept.
pub struct ChainCorrector {
    stages: Vec<Box<dyn Corrector>>,
    name: String,
}

impl ChainCorrector {
    pub fn new(stages: Vec<Box<dyn Corrector>>) -> Self {
        let name = if stages.is_empty() {
            "passthrough".to_string()
        } else {
            stages.iter().map(|s| s.name()).collect::<Vec<_>>().join("+")
        };
        Self { stages, name }
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

impl Corrector for ChainCorrector {
    fn correct(&mut self, text: &str) -> Result<String> {
        let mut current = split_words(text).join(" ");
        for stage in &mut self.stages {
            let next = stage.correct(&current)?;
            if next.trim().is_empty() {
                tracing::debug!(stage = stage.name(), "stage returned empty text, keeping input");
                break;
            }
            current = next;
        }
        Ok(current)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::correction::corrector::PassthroughCorrector;
    use crate::error::LipreadError;

    struct Upper;
    impl Corrector for Upper {
        fn correct(&mut self, text: &str) -> Result<String> {
            Ok(text.to_uppercase())
        }
        fn name(&self) -> &str {
            "upper"
        }
    }

    struct Suffix(&'static str);
    impl Corrector for Suffix {
        fn correct(&mut self, text: &str) -> Result<String> {
            Ok(format!("{text}{}", self.0))
        }
        fn name(&self) -> &str {
            "suffix"
        }
    }

    struct Blank;
    impl Corrector for Blank {
        fn correct(&mut self, _text: &str) -> Result<String> {
            Ok(String::new())
        }
        fn name(&self) -> &str {
            "blank"
        }
    }

    struct Broken;
    impl Corrector for Broken {
        fn correct(&mut self, _text: &str) -> Result<String> {
            Err(LipreadError::Correction {
                message: "offline".into(),
            })
        }
        fn name(&self) -> &str {
            "broken"
        }
    }

    #[test]
    fn stages_run_in_order() {
        let mut chain = ChainCorrector::new(vec![Box::new(Upper), Box::new(Suffix(" now"))]);
        assert_eq!(chain.correct("bin  blue").unwrap(), "BIN BLUE now");
        assert_eq!(chain.name(), "upper+suffix");
        assert_eq!(chain.len(), 2);
    }

    #[test]
    fn empty_chain_normalizes_whitespace() {
        let mut chain = ChainCorrector::new(Vec::new());
        assert!(chain.is_empty());
        assert_eq!(chain.correct(" a   b ").unwrap(), "a b");
        assert_eq!(chain.name(), "passthrough");
    }

    #[test]
    fn empty_stage_output_keeps_previous_text() {
        let mut chain = ChainCorrector::new(vec![
            Box::new(PassthroughCorrector),
            Box::new(Blank),
            Box::new(Upper),
        ]);
        assert_eq!(chain.correct("set red").unwrap(), "set red");
    }

    #[test]
    fn stage_errors_propagate() {
        let mut chain = ChainCorrector::new(vec![Box::new(Upper), Box::new(Broken)]);
        assert!(chain.correct("x").is_err());
    }
}
