//! End-to-end scenarios across baking, propagation and shadow gating

mod scenarios;
