use std::path::Path;

use tract_onnx::{
    prelude::{tvec, Framework, Graph, InferenceModelExt, SimplePlan, TVec, TValue, Tensor, TypedFact, TypedOp},
    tract_hir::tract_ndarray::Array2,
};

use crate::{Error, Result};

pub(crate) type Model = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

pub(crate) fn load(path: impl AsRef<Path>) -> Result<Model> {
    let model = tract_onnx::onnx()
        .model_for_path(path)?
        .into_optimized()?
        .into_runnable()?;
    Ok(model)
}

/// Builds a `[1, n]` int64 tensor, the shape every hub export takes its token inputs in.
pub(crate) fn row(values: impl IntoIterator<Item = i64>) -> Result<TValue> {
    let values: Vec<i64> = values.into_iter().collect();
    let tensor: Tensor = Array2::from_shape_vec((1, values.len()), values)?.into();
    Ok(tensor.into())
}

/// Runs `model` with `inputs` bound by name, in the order the graph declares
/// them. Named inputs the graph does not declare are dropped.
pub(crate) fn run_named(model: &Model, mut inputs: Vec<(&str, TValue)>) -> Result<TVec<TValue>> {
    let graph = model.model();
    let mut ordered: TVec<TValue> = tvec![];

    for outlet in graph.input_outlets()? {
        let name = &graph.node(outlet.node).name;
        let position = inputs
            .iter()
            .position(|(input, _)| *input == name.as_str())
            .ok_or_else(|| Error::MissingInput(name.clone()))?;
        ordered.push(inputs.swap_remove(position).1);
    }

    Ok(model.run(ordered)?)
}
