use serde::Serialize;
use tracing::debug;

use crate::domain::quiz::{Budget, Occasion, QuizAnswers, QuizField, QuizOption, Recipient, Style};
use crate::steps::handoff::QuizHandoff;
use crate::steps::StepError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OptionPrompt {
    pub option: QuizOption,
    pub label: &'static str,
    pub description: &'static str,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct QuestionPrompt {
    pub field: QuizField,
    pub title: &'static str,
    pub subtitle: &'static str,
    pub options: Vec<OptionPrompt>,
}

/// Four questions answered in order; answering one moves to the next.
#[derive(Clone, Debug, Default)]
pub struct QuizStep {
    index: usize,
    answers: QuizAnswers,
}

impl QuizStep {
    pub const QUESTION_COUNT: usize = QuizField::ORDERED.len();

    pub fn new() -> Self {
        Self::default()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn current_field(&self) -> QuizField {
        QuizField::ORDERED[self.index]
    }

    pub fn current_question(&self) -> QuestionPrompt {
        question(self.current_field())
    }

    pub fn answers(&self) -> &QuizAnswers {
        &self.answers
    }

    /// Records `option` against its own question. The index only advances when
    /// the option answers the question on screen and that question is not the
    /// last one.
    pub fn answer(&mut self, option: QuizOption) {
        self.answers.record(option);
        let answered_current = option.field() == self.current_field();
        if answered_current && self.index + 1 < Self::QUESTION_COUNT {
            self.index += 1;
        }
        debug!(
            event_name = "funnel.quiz.answered",
            field = option.field().as_str(),
            value = option.value(),
            index = self.index,
            "quiz answer recorded"
        );
    }

    pub fn previous(&mut self) {
        self.index = self.index.saturating_sub(1);
    }

    pub fn next(&mut self) {
        self.index = (self.index + 1).min(Self::QUESTION_COUNT - 1);
    }

    pub fn is_complete(&self) -> bool {
        self.answers.is_complete()
    }

    /// Fraction of the quiz reached, as `(index + 1) / 4`.
    pub fn progress(&self) -> f32 {
        (self.index + 1) as f32 / Self::QUESTION_COUNT as f32
    }

    pub fn advance(&self) -> Result<QuizHandoff, StepError> {
        let missing = self.answers.missing_fields();
        if !missing.is_empty() {
            return Err(StepError::QuizIncomplete { missing });
        }
        Ok(QuizHandoff { quiz_answers: self.answers.clone() })
    }
}

pub fn question_bank() -> Vec<QuestionPrompt> {
    QuizField::ORDERED.into_iter().map(question).collect()
}

pub fn question(field: QuizField) -> QuestionPrompt {
    match field {
        QuizField::Recipient => QuestionPrompt {
            field,
            title: "Who are you shopping for?",
            subtitle: "Help us understand your special someone",
            options: Recipient::ALL
                .into_iter()
                .map(|recipient| {
                    let (label, description) = match recipient {
                        Recipient::Partner => ("My Partner", "Someone special in your life"),
                        Recipient::Friend => {
                            ("Close Friend", "A dear friend who deserves something beautiful")
                        }
                        Recipient::Family => {
                            ("Family Member", "Mother, sister, daughter, or relative")
                        }
                        Recipient::Colleague => ("Colleague", "Professional yet thoughtful"),
                    };
                    OptionPrompt { option: QuizOption::Recipient(recipient), label, description }
                })
                .collect(),
        },
        QuizField::Occasion => QuestionPrompt {
            field,
            title: "What's the occasion?",
            subtitle: "Every moment deserves the perfect touch",
            options: Occasion::ALL
                .into_iter()
                .map(|occasion| {
                    let (label, description) = match occasion {
                        Occasion::Birthday => ("Birthday", "Celebrating another year of life"),
                        Occasion::Anniversary => {
                            ("Anniversary", "Commemorating special milestones")
                        }
                        Occasion::Holiday => {
                            ("Holiday Season", "Christmas, Easter, or special holidays")
                        }
                        Occasion::JustBecause => {
                            ("Just Because", "Spontaneous moments of appreciation")
                        }
                    };
                    OptionPrompt { option: QuizOption::Occasion(occasion), label, description }
                })
                .collect(),
        },
        QuizField::Budget => QuestionPrompt {
            field,
            title: "What's your budget?",
            subtitle: "Beautiful gifts at every price point",
            options: Budget::ALL
                .into_iter()
                .map(|budget| {
                    let (label, description) = match budget {
                        Budget::Under50 => {
                            ("Under $50", "Thoughtful treasures that won't break the bank")
                        }
                        Budget::From50To100 => {
                            ("$50 - $100", "The sweet spot for meaningful gifts")
                        }
                        Budget::From100To200 => {
                            ("$100 - $200", "Premium pieces for special occasions")
                        }
                        Budget::Over200 => ("$200+", "Luxury items for the most important moments"),
                    };
                    OptionPrompt { option: QuizOption::Budget(budget), label, description }
                })
                .collect(),
        },
        QuizField::Style => QuestionPrompt {
            field,
            title: "What's their style?",
            subtitle: "Help us match their personality",
            options: Style::ALL
                .into_iter()
                .map(|style| {
                    let (label, description) = match style {
                        Style::Minimalist => ("Minimalist", "Clean lines, simple elegance"),
                        Style::Bohemian => ("Bohemian", "Free-spirited, artistic, natural"),
                        Style::Classic => ("Classic", "Timeless, sophisticated, traditional"),
                        Style::Modern => ("Modern", "Contemporary, bold, innovative"),
                    };
                    OptionPrompt { option: QuizOption::Style(style), label, description }
                })
                .collect(),
        },
    }
}
