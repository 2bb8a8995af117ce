//! Domain services

pub mod alert_evaluator;

pub use alert_evaluator::{
    classify_slot, AlertEvaluator, DueState, Evaluation, ReconcilePlan, SlotAction, SlotChange,
    SlotStatus,
};
