use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use rand_distr::{Normal, Distribution};
use rayon::prelude::*;
use std::fmt;
use serde::{Serialize, Deserialize, Serializer, Deserializer};

/// Row-major 2-D buffer of `f32`. Clones share storage.
pub struct Tensor {
    pub data: Arc<RwLock<Vec<f32>>>,
    pub shape: Vec<usize>,
    pub strides: Vec<usize>
}

impl Tensor {
    pub fn zeros(shape: Vec<usize>) -> Self {
        let data: Vec<f32> = vec![0.0; shape.iter().product()];
        Self::from_vec(data, shape)
    }

    /// Samples every element from `N(0, std)`.
    pub fn random_normal(shape: Vec<usize>, std: f32) -> Self {
        let normal = Normal::new(0.0, std).unwrap_or_else(|_| panic!("invalid standard deviation {}", std));
        let mut rng = rand::rng();
        let data: Vec<f32> = (0..shape.iter().product::<usize>()).map(|_| normal.sample(&mut rng)).collect();
        Self::from_vec(data, shape)
    }

    pub fn from_vec(data: Vec<f32>, shape: Vec<usize>) -> Self {
        assert_eq!(data.len(), shape.iter().product::<usize>(), "data length does not match shape {:?}", shape);
        Self {
            data: Arc::new(RwLock::new(data)),
            strides: Tensor::calc_strides(&shape),
            shape
        }
    }

    /// Stacks equally sized rows into a `[rows.len(), width]` tensor.
    pub fn from_rows(rows: &[Vec<f32>], width: usize) -> Self {
        let mut data = Vec::with_capacity(rows.len() * width);
        for row in rows {
            assert_eq!(row.len(), width, "row has {} values, expected {}", row.len(), width);
            data.extend_from_slice(row);
        }
        Self::from_vec(data, vec![rows.len(), width])
    }

    pub fn read(&self) -> RwLockReadGuard<'_, Vec<f32>> {
        self.data.read().unwrap()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, Vec<f32>> {
        self.data.write().unwrap()
    }

    pub fn rows(&self) -> usize {
        self.shape[0]
    }

    pub fn cols(&self) -> usize {
        self.shape[1]
    }

    // view with swapped strides, no copy
    pub fn transpose(&self) -> Self {
        let mut new_shape = self.shape.clone();
        new_shape.reverse();
        let mut new_strides = self.strides.clone();
        new_strides.reverse();

        Self {
            data: Arc::clone(&self.data),
            shape: new_shape,
            strides: new_strides
        }
    }

    pub fn matmul(&self, other: &Tensor) -> Tensor {
        assert_eq!(self.shape.len(), 2, "self must be a 2D tensor.");
        assert_eq!(other.shape.len(), 2, "other must be a 2D tensor.");
        assert_eq!(self.shape[1], other.shape[0], "self columns must equal other rows");

        let m = self.shape[0];
        let k = self.shape[1];
        let n = other.shape[1];

        let c = Tensor::zeros(vec![m, n]);
        if m == 0 || n == 0 {
            return c;
        }

        let a_data = self.read();
        let b_data = other.read();

        {
            let mut c_data_guard = c.write();
            let c_slice: &mut [f32] = &mut c_data_guard;

            c_slice.par_chunks_mut(n).enumerate().for_each(|(m_idx, c_row)| {
                for k_idx in 0..k {
                    let a_val = a_data[m_idx * self.strides[0] + k_idx * self.strides[1]];
                    for n_idx in 0..n {
                        let b_val = b_data[k_idx * other.strides[0] + n_idx * other.strides[1]];
                        c_row[n_idx] += a_val * b_val;
                    }
                }
            });
        }

        c
    }

    // elementwise over two tensors of the same shape
    pub fn map2<F>(&self, other: &Tensor, f: F) -> Tensor
    where F: Fn(f32, f32) -> f32 + Sync + Send {
        assert_eq!(self.shape, other.shape, "tensors must have the same shape");

        let data1 = self.read();
        let data2 = other.read();
        let new_data: Vec<f32> = data1.par_iter().zip(data2.par_iter()).map(|(&x1, &x2)| f(x1, x2)).collect();
        Tensor::from_vec(new_data, self.shape.clone())
    }

    /// Copies row `index`, honouring strides so transposed views read correctly.
    pub fn row(&self, index: usize) -> Vec<f32> {
        assert_eq!(self.shape.len(), 2, "row only works for 2D tensors");
        assert!(index < self.shape[0], "row index {} out of bounds for {} rows", index, self.shape[0]);

        let data = self.read();
        (0..self.shape[1])
            .map(|j| data[index * self.strides[0] + j * self.strides[1]])
            .collect()
    }

    fn calc_strides(shape: &[usize]) -> Vec<usize> {
        let mut strides: Vec<usize> = vec![1; shape.len()];
        for i in (0..strides.len().saturating_sub(1)).rev() {
            strides[i] = strides[i+1] * shape[i+1];
        }
        strides
    }
}

impl Clone for Tensor {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
            shape: self.shape.clone(),
            strides: self.strides.clone()
        }
    }
}

impl PartialEq for Tensor {
    fn eq(&self, other: &Self) -> bool {
        if self.shape != other.shape {
            return false;
        }

        *self.read() == *other.read()
    }
}

impl fmt::Debug for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tensor")
         .field("shape", &self.shape)
         .field("data", &*self.read())
         .finish()
    }
}

#[derive(Serialize, Deserialize)]
struct StoredTensor {
    shape: Vec<usize>,
    data: Vec<f32>,
}

// transposed views are stored contiguously
impl Serialize for Tensor {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where S: Serializer {
        let data = if self.shape.len() == 2 {
            (0..self.shape[0]).flat_map(|i| self.row(i)).collect()
        } else {
            self.read().clone()
        };
        StoredTensor { shape: self.shape.clone(), data }.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Tensor {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where D: Deserializer<'de> {
        let stored = StoredTensor::deserialize(deserializer)?;
        if stored.data.len() != stored.shape.iter().product::<usize>() {
            return Err(serde::de::Error::custom(format!(
                "tensor of shape {:?} cannot hold {} values", stored.shape, stored.data.len()
            )));
        }
        Ok(Tensor::from_vec(stored.data, stored.shape))
    }
}
