//! Dense dispatch cost tensor.

use crate::models::{GroupKey, Shape};

/// A dense `[source][dest][type][period]` cost tensor stored in row-major
/// order.
///
/// # Examples
///
/// ```
/// use u_dispatch::cost::CostTensor;
/// use u_dispatch::models::Shape;
///
/// let mut costs = CostTensor::new(Shape::new(2, 1, 1));
/// costs.set(0, 1, 0, 0, 5.0);
/// assert_eq!(costs.get(0, 1, 0, 0), 5.0);
/// assert_eq!(costs.get(1, 0, 0, 0), 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct CostTensor {
    data: Vec<f64>,
    shape: Shape,
}

impl CostTensor {
    /// Creates a tensor of the given shape, initialized to zero.
    pub fn new(shape: Shape) -> Self {
        Self {
            data: vec![0.0; shape.num_assignments()],
            shape,
        }
    }

    /// Creates a tensor from explicit row-major data.
    ///
    /// Returns `None` if the data length doesn't match the shape.
    pub fn from_data(shape: Shape, data: Vec<f64>) -> Option<Self> {
        if data.len() != shape.num_assignments() {
            return None;
        }
        Some(Self { data, shape })
    }

    /// Builds a tensor by evaluating `f(source, dest, type, period)` at
    /// every slot.
    pub fn from_fn<F>(shape: Shape, mut f: F) -> Self
    where
        F: FnMut(usize, usize, usize, usize) -> f64,
    {
        let data = (0..shape.num_assignments())
            .map(|index| {
                let (key, dest) = shape.assignment_key(index);
                f(key.source, dest, key.customer_type, key.period)
            })
            .collect();
        Self { data, shape }
    }

    /// Returns the cost of sending one customer of type `customer_type`,
    /// available in `period`, from `source` to `dest`.
    ///
    /// # Panics
    ///
    /// Panics if any index is out of bounds.
    pub fn get(&self, source: usize, dest: usize, customer_type: usize, period: usize) -> f64 {
        self.at(GroupKey::new(source, customer_type, period), dest)
    }

    /// Cost of sending one customer of group `key` to `dest`.
    pub fn at(&self, key: GroupKey, dest: usize) -> f64 {
        self.data[self.shape.assignment_index(key, dest)]
    }

    /// Sets a single cost entry.
    pub fn set(&mut self, source: usize, dest: usize, customer_type: usize, period: usize, cost: f64) {
        let index = self
            .shape
            .assignment_index(GroupKey::new(source, customer_type, period), dest);
        self.data[index] = cost;
    }

    /// Shape of this tensor.
    pub fn shape(&self) -> Shape {
        self.shape
    }

    /// Raw row-major data.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Returns the first entry that is negative, NaN or infinite, as
    /// `(key, dest, value)`.
    pub fn first_invalid(&self) -> Option<(GroupKey, usize, f64)> {
        self.data
            .iter()
            .position(|c| !c.is_finite() || *c < 0.0)
            .map(|index| {
                let (key, dest) = self.shape.assignment_key(index);
                (key, dest, self.data[index])
            })
    }
}
