use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Recipient {
    Partner,
    Friend,
    Family,
    Colleague,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Occasion {
    Birthday,
    Anniversary,
    Holiday,
    JustBecause,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Budget {
    #[serde(rename = "under50")]
    Under50,
    #[serde(rename = "50-100")]
    From50To100,
    #[serde(rename = "100-200")]
    From100To200,
    #[serde(rename = "over200")]
    Over200,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Style {
    Minimalist,
    Bohemian,
    Classic,
    Modern,
}

impl Recipient {
    pub const ALL: [Self; 4] = [Self::Partner, Self::Friend, Self::Family, Self::Colleague];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Partner => "partner",
            Self::Friend => "friend",
            Self::Family => "family",
            Self::Colleague => "colleague",
        }
    }
}

impl Occasion {
    pub const ALL: [Self; 4] =
        [Self::Birthday, Self::Anniversary, Self::Holiday, Self::JustBecause];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Birthday => "birthday",
            Self::Anniversary => "anniversary",
            Self::Holiday => "holiday",
            Self::JustBecause => "justbecause",
        }
    }
}

impl Budget {
    pub const ALL: [Self; 4] =
        [Self::Under50, Self::From50To100, Self::From100To200, Self::Over200];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Under50 => "under50",
            Self::From50To100 => "50-100",
            Self::From100To200 => "100-200",
            Self::Over200 => "over200",
        }
    }
}

impl Style {
    pub const ALL: [Self; 4] = [Self::Minimalist, Self::Bohemian, Self::Classic, Self::Modern];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Minimalist => "minimalist",
            Self::Bohemian => "bohemian",
            Self::Classic => "classic",
            Self::Modern => "modern",
        }
    }
}

/// The four quiz questions, in the order they are asked.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuizField {
    Recipient,
    Occasion,
    Budget,
    Style,
}

impl QuizField {
    pub const ORDERED: [Self; 4] = [Self::Recipient, Self::Occasion, Self::Budget, Self::Style];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Recipient => "recipient",
            Self::Occasion => "occasion",
            Self::Budget => "budget",
            Self::Style => "style",
        }
    }
}

/// A single answer choice, typed by the question it belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "lowercase")]
pub enum QuizOption {
    Recipient(Recipient),
    Occasion(Occasion),
    Budget(Budget),
    Style(Style),
}

impl QuizOption {
    pub fn field(&self) -> QuizField {
        match self {
            Self::Recipient(_) => QuizField::Recipient,
            Self::Occasion(_) => QuizField::Occasion,
            Self::Budget(_) => QuizField::Budget,
            Self::Style(_) => QuizField::Style,
        }
    }

    pub fn value(&self) -> &'static str {
        match self {
            Self::Recipient(value) => value.as_str(),
            Self::Occasion(value) => value.as_str(),
            Self::Budget(value) => value.as_str(),
            Self::Style(value) => value.as_str(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuizAnswers {
    pub recipient: Option<Recipient>,
    pub occasion: Option<Occasion>,
    pub budget: Option<Budget>,
    pub style: Option<Style>,
}

impl QuizAnswers {
    /// Setting the same option twice leaves the answers unchanged.
    pub fn record(&mut self, option: QuizOption) {
        match option {
            QuizOption::Recipient(value) => self.recipient = Some(value),
            QuizOption::Occasion(value) => self.occasion = Some(value),
            QuizOption::Budget(value) => self.budget = Some(value),
            QuizOption::Style(value) => self.style = Some(value),
        }
    }

    pub fn is_answered(&self, field: QuizField) -> bool {
        match field {
            QuizField::Recipient => self.recipient.is_some(),
            QuizField::Occasion => self.occasion.is_some(),
            QuizField::Budget => self.budget.is_some(),
            QuizField::Style => self.style.is_some(),
        }
    }

    pub fn missing_fields(&self) -> Vec<QuizField> {
        QuizField::ORDERED.into_iter().filter(|field| !self.is_answered(*field)).collect()
    }

    pub fn is_complete(&self) -> bool {
        QuizField::ORDERED.iter().all(|field| self.is_answered(*field))
    }
}
