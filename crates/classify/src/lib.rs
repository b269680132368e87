pub mod model;
pub mod prediction;
pub mod tensor;

pub use model::{Classifier, ClassifyError, OnnxClassifier};
pub use prediction::Prediction;
pub use tensor::{load_tensor, to_input_tensor, INPUT_SHAPE, INPUT_SIZE};

pub use tract_onnx::prelude::tract_ndarray::Array4;
