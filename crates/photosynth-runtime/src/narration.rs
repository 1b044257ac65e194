//! Plain-language explanations of the current simulation state.
//!
//! A [`Narrator`] receives a read-only [`NarrationRequest`] and returns text.
//! [`consult`] wraps any narrator with a timeout and folds every failure into
//! a user-visible [`Narration::Fallback`]; it never touches the simulation.

use std::fmt::Write as _;
use std::future::Future;
use std::time::Duration;

use photosynth_core::environment::EnvironmentState;
use photosynth_core::model::{LimitingFactor, ProductionStats, compute_stats};
use tracing::{debug, warn};

use crate::scheduler::SimulatorHandle;

/// Shown when a narrator fails or times out.
pub const UNAVAILABLE_MESSAGE: &str =
    "The botanist is currently unavailable. (Error connecting to AI)";

/// Shown when a narrator answers with nothing.
pub const EMPTY_REPLY_MESSAGE: &str = "The botanist is thinking...";

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NarrationError {
    #[error("narrator unavailable: {reason}")]
    Unavailable { reason: String },
    #[error("narrator returned an empty reply")]
    Empty,
    #[error("narrator timed out after {0:?}")]
    TimedOut(Duration),
}

/// State handed to a narrator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NarrationRequest {
    pub environment: EnvironmentState,
    pub stats: ProductionStats,
}

impl NarrationRequest {
    pub fn new(environment: EnvironmentState) -> Self {
        Self {
            environment,
            stats: compute_stats(&environment),
        }
    }

    /// Environment and stats read together from a running simulator.
    pub fn from_handle(handle: &SimulatorHandle) -> Self {
        let (environment, stats) = handle.observe();
        Self { environment, stats }
    }

    /// Tutoring prompt for a language-model narrator.
    pub fn prompt(&self) -> String {
        let env = &self.environment;
        let mut prompt = String::from(
            "You are an expert botanist teaching a student about photosynthesis.\n\
             The current simulation conditions are:\n",
        );
        let _ = writeln!(prompt, "- Light Intensity: {}%", env.light_intensity());
        let _ = writeln!(prompt, "- CO2 Level: {}%", env.co2_level());
        let _ = writeln!(prompt, "- Water Availability: {}%", env.water_level());
        let _ = writeln!(prompt, "- Temperature: {}°C", env.temperature());
        prompt.push('\n');
        let _ = writeln!(
            prompt,
            "The current limiting factor is: {}.",
            self.stats.limiting_factor
        );
        let _ = writeln!(
            prompt,
            "The glucose production rate is: {:.2} (arbitrary units).",
            self.stats.glucose_rate
        );
        prompt.push_str(
            "\nExplain simply why the rate is what it is, what the limiting factor \
             implies, and suggest one change to improve efficiency. \
             Keep it under 3 sentences.",
        );
        prompt
    }
}

/// Something that can explain a simulation state.
pub trait Narrator {
    fn narrate(
        &self,
        request: &NarrationRequest,
    ) -> impl Future<Output = Result<String, NarrationError>> + Send;
}

/// The outcome of [`consult`]: always displayable.
#[derive(Debug, Clone, PartialEq)]
pub enum Narration {
    Answer(String),
    Fallback {
        message: &'static str,
        error: NarrationError,
    },
}

impl Narration {
    pub fn text(&self) -> &str {
        match self {
            Narration::Answer(text) => text,
            Narration::Fallback { message, .. } => message,
        }
    }

    pub fn is_answer(&self) -> bool {
        matches!(self, Narration::Answer(_))
    }
}

/// Ask `narrator` about `request`, giving up after `timeout`.
pub async fn consult<N: Narrator>(
    narrator: &N,
    request: &NarrationRequest,
    timeout: Duration,
) -> Narration {
    debug!(limiting = %request.stats.limiting_factor, "consulting narrator");
    let result = match tokio::time::timeout(timeout, narrator.narrate(request)).await {
        Ok(Ok(text)) if text.trim().is_empty() => Err(NarrationError::Empty),
        Ok(result) => result,
        Err(_) => Err(NarrationError::TimedOut(timeout)),
    };

    match result {
        Ok(text) => Narration::Answer(text),
        Err(error) => {
            warn!(%error, "narration failed");
            let message = match error {
                NarrationError::Empty => EMPTY_REPLY_MESSAGE,
                _ => UNAVAILABLE_MESSAGE,
            };
            Narration::Fallback { message, error }
        }
    }
}

// ---------------------------------------------------------------------------
// Rule-based narrator
// ---------------------------------------------------------------------------

/// Offline narrator keyed on the limiting factor.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleNarrator;

impl RuleNarrator {
    pub fn explain(&self, request: &NarrationRequest) -> String {
        let env = &request.environment;
        let stats = &request.stats;
        let (why, advice) = match stats.limiting_factor {
            LimitingFactor::Light if env.light_intensity() == 0.0 => (
                "Without light the light reactions make no ATP or NADPH, so the Calvin cycle stalls.",
                "Turn the light on.",
            ),
            LimitingFactor::Light => (
                "Light is the scarcest input, so the light reactions set the pace.",
                "Increase light intensity.",
            ),
            LimitingFactor::Co2 if env.water_level() <= 20.0 => (
                "The plant is closing its stomata to save water, which starves it of CO2.",
                "Water the plant so the stomata reopen.",
            ),
            LimitingFactor::Co2 => (
                "Rubisco cannot fix carbon faster than CO2 arrives.",
                "Raise the CO2 level.",
            ),
            LimitingFactor::Temperature if env.temperature() >= 45.0 => (
                "It is hot enough to denature the enzymes, so production has stopped.",
                "Cool the leaf towards 25°C.",
            ),
            LimitingFactor::Temperature if env.temperature() <= 0.0 => (
                "At freezing the enzymes are inactive, so production has stopped.",
                "Warm the leaf towards 25°C.",
            ),
            LimitingFactor::Temperature => (
                "The temperature is away from the 25°C optimum, slowing the enzymes.",
                "Move the temperature closer to 25°C.",
            ),
            LimitingFactor::Water => (
                "Water is the scarcest input and is needed both as an electron source and to keep the stomata open.",
                "Increase water availability.",
            ),
        };
        format!(
            "Glucose is being made at {:.2} units ({:.0}% efficiency), limited by {}. {why} {advice}",
            stats.glucose_rate,
            stats.efficiency_percent(),
            stats.limiting_factor.label(),
        )
    }
}

impl Narrator for RuleNarrator {
    async fn narrate(&self, request: &NarrationRequest) -> Result<String, NarrationError> {
        Ok(self.explain(request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use photosynth_core::test_utils::*;

    struct Failing;

    impl Narrator for Failing {
        async fn narrate(&self, _: &NarrationRequest) -> Result<String, NarrationError> {
            Err(NarrationError::Unavailable {
                reason: "no network".into(),
            })
        }
    }

    struct Silent;

    impl Narrator for Silent {
        async fn narrate(&self, _: &NarrationRequest) -> Result<String, NarrationError> {
            Ok("   ".into())
        }
    }

    struct Slow;

    impl Narrator for Slow {
        async fn narrate(&self, _: &NarrationRequest) -> Result<String, NarrationError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok("late".into())
        }
    }

    const TIMEOUT: Duration = Duration::from_secs(10);

    #[test]
    fn prompt_lists_inputs_and_rate() {
        let request = NarrationRequest::new(drought());
        let prompt = request.prompt();
        assert!(prompt.contains("- Light Intensity: 80%"));
        assert!(prompt.contains("- Water Availability: 10%"));
        assert!(prompt.contains("- Temperature: 25°C"));
        assert!(prompt.contains("The current limiting factor is: Water."));
        assert!(prompt.contains("The glucose production rate is: 0.50"));
    }

    #[test]
    fn rule_narrator_mentions_limit() {
        let text = RuleNarrator.explain(&NarrationRequest::new(env(50.0, 50.0, 50.0, 48.0)));
        assert!(text.contains("denature"));
        assert!(text.starts_with("Glucose is being made at 0.00 units"));

        let text = RuleNarrator.explain(&NarrationRequest::new(env(0.0, 50.0, 50.0, 25.0)));
        assert!(text.contains("Turn the light on"));
    }

    #[tokio::test]
    async fn rule_narrator_answers() {
        let narration = consult(&RuleNarrator, &NarrationRequest::new(full_sun()), TIMEOUT).await;
        assert!(narration.is_answer());
        assert!(narration.text().contains("100% efficiency"));
    }

    #[tokio::test]
    async fn failure_becomes_unavailable_message() {
        let narration = consult(&Failing, &NarrationRequest::new(full_sun()), TIMEOUT).await;
        assert_eq!(narration.text(), UNAVAILABLE_MESSAGE);
        assert!(matches!(
            narration,
            Narration::Fallback {
                error: NarrationError::Unavailable { .. },
                ..
            }
        ));
    }

    #[tokio::test]
    async fn blank_reply_becomes_thinking_message() {
        let narration = consult(&Silent, &NarrationRequest::new(full_sun()), TIMEOUT).await;
        assert_eq!(narration.text(), EMPTY_REPLY_MESSAGE);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_narrator_times_out() {
        let narration = consult(&Slow, &NarrationRequest::new(full_sun()), TIMEOUT).await;
        assert_eq!(
            narration,
            Narration::Fallback {
                message: UNAVAILABLE_MESSAGE,
                error: NarrationError::TimedOut(TIMEOUT),
            }
        );
    }
}
