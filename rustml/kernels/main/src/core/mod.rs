pub(crate) mod activation;
pub(crate) mod attention;
pub(crate) mod config;
pub(crate) mod layer_norm;
pub(crate) mod mask;
pub(crate) mod rope;
pub(crate) mod sampling;
pub(crate) mod softmax;
