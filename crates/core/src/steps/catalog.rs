use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use crate::domain::product::{Product, ProductId};
use crate::domain::quiz::{Occasion, QuizAnswers};
use crate::pricing::{compute_savings, compute_subtotal, featured, CatalogProvider, SelectionSet};
use crate::steps::handoff::{CatalogHandoff, QuizHandoff};
use crate::steps::StepError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct CatalogSummary {
    pub subtotal: Decimal,
    pub savings: Decimal,
    pub item_count: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CatalogHeadline {
    pub title: String,
    pub blurb: String,
}

pub struct CatalogStep {
    quiz_answers: QuizAnswers,
    products: Vec<Product>,
    selected: SelectionSet<ProductId>,
    hovered: Option<ProductId>,
}

impl CatalogStep {
    pub fn new(handoff: Option<QuizHandoff>, provider: &dyn CatalogProvider) -> Self {
        Self {
            quiz_answers: handoff.unwrap_or_default().quiz_answers,
            products: provider.products(),
            selected: SelectionSet::new(),
            hovered: None,
        }
    }

    pub fn quiz_answers(&self) -> &QuizAnswers {
        &self.quiz_answers
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn featured(&self) -> Vec<&Product> {
        featured(&self.products)
    }

    pub fn selected(&self) -> &SelectionSet<ProductId> {
        &self.selected
    }

    pub fn toggle_product(&mut self, id: ProductId) -> bool {
        let selected = self.selected.toggle(id.clone());
        debug!(
            event_name = "funnel.selection.toggled",
            step = "catalog",
            product_id = %id,
            selected,
            selection_size = self.selected.len(),
            "product selection toggled"
        );
        selected
    }

    /// Presentation-only hover marker. Has no effect on selection or pricing.
    pub fn set_hovered(&mut self, id: Option<ProductId>) {
        self.hovered = id;
    }

    pub fn hovered(&self) -> Option<&ProductId> {
        self.hovered.as_ref()
    }

    pub fn summary(&self) -> Option<CatalogSummary> {
        if self.selected.is_empty() {
            return None;
        }
        Some(CatalogSummary {
            subtotal: compute_subtotal(&self.selected, &self.products),
            savings: compute_savings(&self.selected, &self.products),
            item_count: self.selected.len(),
        })
    }

    /// Personalized header, shown once the recipient and occasion are known.
    pub fn headline(&self) -> Option<CatalogHeadline> {
        let recipient = self.quiz_answers.recipient?;
        let occasion = self.quiz_answers.occasion?;
        let occasion_phrase = match occasion {
            Occasion::JustBecause => "showing you care".to_string(),
            other => other.as_str().to_string(),
        };
        Some(CatalogHeadline {
            title: format!("Perfect Gifts for Your {}", recipient.as_str()),
            blurb: format!(
                "Based on your preferences, we've curated these beautiful pieces that would be perfect for {occasion_phrase}."
            ),
        })
    }

    pub fn advance(&self) -> Result<CatalogHandoff, StepError> {
        if self.selected.is_empty() {
            return Err(StepError::EmptyProductSelection);
        }
        Ok(CatalogHandoff {
            selected_product_ids: self.selected.clone(),
            catalog: self.products.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::CatalogStep;
    use crate::domain::product::ProductId;
    use crate::domain::quiz::{Occasion, QuizAnswers, Recipient};
    use crate::pricing::StaticCatalog;
    use crate::steps::handoff::QuizHandoff;
    use crate::steps::StepError;

    fn step() -> CatalogStep {
        CatalogStep::new(None, &StaticCatalog::reference())
    }

    #[test]
    fn missing_handoff_yields_empty_answers() {
        let step = step();
        assert_eq!(step.quiz_answers(), &QuizAnswers::default());
        assert!(step.headline().is_none());
        assert_eq!(step.products().len(), 6);
    }

    #[test]
    fn summary_tracks_selection() {
        let mut step = step();
        assert!(step.summary().is_none());

        step.toggle_product(ProductId::new("1"));
        step.toggle_product(ProductId::new("3"));
        let summary = step.summary().expect("non-empty selection has a summary");
        assert_eq!(summary.subtotal, Decimal::from(167));
        assert_eq!(summary.savings, Decimal::from(57));
        assert_eq!(summary.item_count, 2);

        step.toggle_product(ProductId::new("1"));
        step.toggle_product(ProductId::new("3"));
        assert!(step.summary().is_none());
    }

    #[test]
    fn advance_requires_a_selection_and_copies_state() {
        let mut step = step();
        assert_eq!(step.advance().expect_err("empty"), StepError::EmptyProductSelection);

        step.toggle_product(ProductId::new("5"));
        let handoff = step.advance().expect("selection present");
        step.toggle_product(ProductId::new("6"));

        assert_eq!(handoff.selected_product_ids.len(), 1);
        assert_eq!(handoff.catalog.len(), 6);
    }

    #[test]
    fn hover_does_not_touch_selection() {
        let mut step = step();
        step.set_hovered(Some(ProductId::new("2")));
        assert_eq!(step.hovered().map(|id| id.as_str()), Some("2"));
        assert!(step.selected().is_empty());
    }

    #[test]
    fn headline_renders_just_because_as_showing_you_care() {
        let answers = QuizAnswers {
            recipient: Some(Recipient::Partner),
            occasion: Some(Occasion::JustBecause),
            ..QuizAnswers::default()
        };
        let step = CatalogStep::new(
            Some(QuizHandoff { quiz_answers: answers }),
            &StaticCatalog::reference(),
        );
        let headline = step.headline().expect("recipient and occasion known");
        assert_eq!(headline.title, "Perfect Gifts for Your partner");
        assert!(headline.blurb.ends_with("perfect for showing you care."));
    }

    #[test]
    fn featured_lists_flagged_products() {
        let step = step();
        assert_eq!(step.featured().len(), 3);
    }
}
