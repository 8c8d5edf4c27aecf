use std::collections::HashMap;
use std::path::Path;

use rand::Rng;

use crate::{
    activation::activation::ActivationFunction,
    error::{Result, ValidError},
    layers::dense::Layer,
    math::matrix::Matrix,
    network::{
        metadata::ModelMetadata,
        model::Model,
        npz::{self, NpyArray, NpyData},
        spec::{LayerSpec, NetworkSpec},
    },
};

const ARCHITECTURE_ENTRY: &str = "special:architecture.json";
const OPTIONS_ENTRY: &str = "special:model.json";

#[derive(Debug, Clone)]
pub struct Network {
    pub name: String,
    pub layers: Vec<Layer>,
    pub metadata: Option<ModelMetadata>,
}

impl Network {
    /// Builds a freshly initialised network from (size, input_size, activation) tuples.
    pub fn new(name: &str, layer_specs: Vec<(usize, usize, ActivationFunction)>) -> Network {
        Network::with_rng(name, layer_specs, &mut rand::thread_rng())
    }

    /// Same as `new` but draws initial weights from `rng`, for reproducible runs.
    pub fn with_rng<R: Rng + ?Sized>(
        name: &str,
        layer_specs: Vec<(usize, usize, ActivationFunction)>,
        rng: &mut R,
    ) -> Network {
        let layers = layer_specs.into_iter()
            .map(|(size, input_size, activation)| Layer::new(size, input_size, activation, rng))
            .collect();
        Network { name: name.to_owned(), layers, metadata: None }
    }

    pub fn spec(&self) -> NetworkSpec {
        NetworkSpec {
            name: self.name.clone(),
            layers: self.layers.iter()
                .map(|l| LayerSpec { size: l.size, input_size: l.input_size, activation: l.activator })
                .collect(),
            metadata: self.metadata.clone(),
        }
    }

    /// Human-readable name of output class `class`, if the network carries labels.
    pub fn output_label(&self, class: usize) -> Option<&str> {
        self.metadata.as_ref()?.output_labels.as_ref()?.get(class).map(String::as_str)
    }

    /// Width of the output layer, i.e. the number of classes scored per sample.
    pub fn num_classes(&self) -> usize {
        self.layers.last().map_or(0, |l| l.size)
    }

    /// Restores a network written by `Model::save`.
    pub fn load_npz(path: &Path) -> Result<Network> {
        let mut arrays: HashMap<String, NpyArray> = npz::read_npz(path)?.into_iter().collect();

        let spec: NetworkSpec = match arrays.remove(ARCHITECTURE_ENTRY) {
            Some(NpyArray { data: NpyData::U8(bytes), .. }) => serde_json::from_slice(&bytes)?,
            _ => return Err(ValidError::Checkpoint(format!("missing '{}'", ARCHITECTURE_ENTRY))),
        };

        let mut layers = Vec::with_capacity(spec.layers.len());
        for (i, layer) in spec.layers.iter().enumerate() {
            let weights = take_matrix(&mut arrays, &format!("layer_{}.W", i), layer.input_size, layer.size)?;
            let biases = take_matrix(&mut arrays, &format!("layer_{}.b", i), 1, layer.size)?;
            layers.push(Layer::from_parts(weights, biases, layer.activation));
        }

        Ok(Network { name: spec.name, layers, metadata: spec.metadata })
    }
}

fn take_matrix(
    arrays: &mut HashMap<String, NpyArray>,
    name: &str,
    rows: usize,
    cols: usize,
) -> Result<Matrix> {
    match arrays.remove(name) {
        Some(NpyArray { shape, data: NpyData::F64(values) }) if shape == [rows, cols] => {
            Matrix::from_vec(rows, cols, values)
        }
        Some(other) => Err(ValidError::Checkpoint(format!(
            "'{}' has shape {:?}, expected [{}, {}]",
            name, other.shape, rows, cols
        ))),
        None => Err(ValidError::Checkpoint(format!("missing '{}'", name))),
    }
}

impl Model for Network {
    /// Forward pass over a batch. Outside inference mode each layer keeps its
    /// activations for backprop.
    fn forward(&mut self, inputs: &Matrix, inference: bool) -> Result<Matrix> {
        let mut current = inputs.clone();
        for layer in &mut self.layers {
            current = layer.forward(&current)?;
            layer.neurons = if inference { None } else { Some(current.clone()) };
        }
        Ok(current)
    }

    fn save(&self, path: &Path, metadata: Option<&str>) -> Result<()> {
        let architecture = serde_json::to_vec(&self.spec())?;

        let mut arrays = vec![(ARCHITECTURE_ENTRY.to_owned(), NpyArray::bytes(architecture))];
        for (i, layer) in self.layers.iter().enumerate() {
            let w = &layer.weights;
            let b = &layer.biases;
            arrays.push((format!("layer_{}.W", i), NpyArray::f64(vec![w.rows, w.cols], w.data.clone())));
            arrays.push((format!("layer_{}.b", i), NpyArray::f64(vec![b.rows, b.cols], b.data.clone())));
        }
        if let Some(meta) = metadata {
            arrays.push((OPTIONS_ENTRY.to_owned(), NpyArray::bytes(meta.as_bytes().to_vec())));
        }

        npz::write_npz(path, &arrays)
    }
}
