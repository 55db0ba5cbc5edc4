pub mod expression_classifier;
pub mod expression_event;
pub mod expression_label;
pub mod expression_state;
