pub mod generation_result;
pub mod model_attempt;
pub mod quiz;
pub mod shapes;
