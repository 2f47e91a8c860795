//! The [CoefficientTable] holds the per-ingredient cost and nutritional coefficients
//! that the model is built from.
//!
//! A table can only be obtained through [CoefficientTable::validate],
//! so every table the engine sees is non-empty, has unique normalized names
//! and only holds values within their documented ranges.
use fnv::FnvHashMap as HashMap;

use crate::error::{Error, Result};

/// One row of the coefficient table
#[derive(Debug, Clone, PartialEq)]
pub struct Ingredient {
    /// Lower-cased, trimmed ingredient name
    pub name: String,
    /// Cost per kg
    pub cost: f64,
    /// Protein content, in [0, 100]
    pub protein: f64,
    /// Energy per kg, in [0, ∞)
    pub energy: f64,
    /// Calcium content, in [0, 100]
    pub calcium: f64,
}

impl Ingredient {
    /// Create an ingredient row. Nothing is checked until the row goes through
    /// [CoefficientTable::validate].
    pub fn new(
        name: impl Into<String>,
        cost: f64,
        protein: f64,
        energy: f64,
        calcium: f64,
    ) -> Self {
        Ingredient {
            name: name.into(),
            cost,
            protein,
            energy,
            calcium,
        }
    }

    /// The value of one numeric column for this ingredient
    pub fn get(&self, attribute: Attribute) -> f64 {
        match attribute {
            Attribute::Cost => self.cost,
            Attribute::Protein => self.protein,
            Attribute::Energy => self.energy,
            Attribute::Calcium => self.calcium,
        }
    }
}

/// The numeric columns of a coefficient table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    Cost,
    Protein,
    Energy,
    Calcium,
}

impl Attribute {
    /// All numeric columns, in table order
    pub const ALL: [Attribute; 4] = [
        Attribute::Cost,
        Attribute::Protein,
        Attribute::Energy,
        Attribute::Calcium,
    ];

    /// Name of the column in data files and messages
    pub fn column_name(self) -> &'static str {
        match self {
            Attribute::Cost => "costo",
            Attribute::Protein => "proteina",
            Attribute::Energy => "energia",
            Attribute::Calcium => "calcio",
        }
    }

    /// The inclusive range a value of this column must lie in
    pub fn range(self) -> (f64, f64) {
        match self {
            Attribute::Cost | Attribute::Energy => (0., f64::INFINITY),
            Attribute::Protein | Attribute::Calcium => (0., 100.),
        }
    }
}

/// An immutable, validated, ordered list of ingredients.
///
/// ```
/// use feedmix::{CoefficientTable, Ingredient};
///
/// let table = CoefficientTable::validate(vec![
///     Ingredient::new(" Trigo ", 6.2, 0.09, 3350., 0.0002),
///     Ingredient::new("sandia", 11.5, 0.46, 2800., 0.0025),
/// ])?;
/// assert_eq!(table.len(), 2);
/// assert_eq!(table.index_of("trigo"), Some(0));
/// # Ok::<_, feedmix::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CoefficientTable {
    ingredients: Vec<Ingredient>,
}

impl CoefficientTable {
    /// Normalize and check the given rows, returning a table the engine can consume.
    ///
    /// Names are lower-cased and trimmed. The call fails with [Error::InvalidInput]
    /// when there are no rows, when a name is empty or appears twice,
    /// or when a value is not finite or out of its column's range.
    pub fn validate(rows: Vec<Ingredient>) -> Result<Self> {
        if rows.is_empty() {
            return Err(Error::invalid_input("the coefficient table has no rows"));
        }
        let mut seen: HashMap<String, usize> = HashMap::default();
        let mut ingredients = Vec::with_capacity(rows.len());
        for (row, mut ingredient) in rows.into_iter().enumerate() {
            ingredient.name = normalize_name(&ingredient.name);
            if ingredient.name.is_empty() {
                return Err(Error::invalid_input(format!(
                    "row {} has an empty ingredient name",
                    row + 1
                )));
            }
            if let Some(first) = seen.insert(ingredient.name.clone(), row) {
                return Err(Error::invalid_input(format!(
                    "ingredient '{}' appears on rows {} and {}",
                    ingredient.name,
                    first + 1,
                    row + 1
                )));
            }
            for attribute in Attribute::ALL {
                check_range(&ingredient, attribute)?;
            }
            ingredients.push(ingredient);
        }
        Ok(CoefficientTable { ingredients })
    }

    /// The number of ingredients
    pub fn len(&self) -> usize {
        self.ingredients.len()
    }

    /// Always false: validated tables have at least one row
    pub fn is_empty(&self) -> bool {
        self.ingredients.is_empty()
    }

    /// Iterates over the rows in order
    pub fn iter(&self) -> impl Iterator<Item = &Ingredient> {
        self.ingredients.iter()
    }

    /// The row at the given position
    pub fn ingredient(&self, index: usize) -> Option<&Ingredient> {
        self.ingredients.get(index)
    }

    /// Position of the ingredient with the given name, after normalization
    pub fn index_of(&self, name: &str) -> Option<usize> {
        let name = normalize_name(name);
        self.ingredients.iter().position(|i| i.name == name)
    }

    /// Ingredient names, in order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.ingredients.iter().map(|i| i.name.as_str())
    }

    /// One numeric column as a dense coefficient vector
    pub fn column(&self, attribute: Attribute) -> Vec<f64> {
        self.ingredients.iter().map(|i| i.get(attribute)).collect()
    }

    /// Total of a column weighted by the given quantities
    pub fn dot(&self, attribute: Attribute, quantities: &[f64]) -> f64 {
        self.ingredients
            .iter()
            .zip(quantities)
            .map(|(i, q)| i.get(attribute) * q)
            .sum()
    }
}

impl<'a> IntoIterator for &'a CoefficientTable {
    type Item = &'a Ingredient;
    type IntoIter = std::slice::Iter<'a, Ingredient>;

    fn into_iter(self) -> Self::IntoIter {
        self.ingredients.iter()
    }
}

pub(crate) fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

fn check_range(ingredient: &Ingredient, attribute: Attribute) -> Result<()> {
    let value = ingredient.get(attribute);
    let (min, max) = attribute.range();
    if value.is_nan() || value < min || value > max || value == f64::INFINITY {
        return Err(Error::invalid_input(format!(
            "column '{}' of ingredient '{}' is {}, outside of the allowed range ({}-{})",
            attribute.column_name(),
            ingredient.name,
            value,
            min,
            max
        )));
    }
    Ok(())
}

/// The four-ingredient table of the reference feed-mix problem
pub fn worked_example() -> CoefficientTable {
    CoefficientTable {
        ingredients: vec![
            Ingredient::new("trigo", 6.2, 0.09, 3350., 0.0002),
            Ingredient::new("sandia", 11.5, 0.46, 2800., 0.0025),
            Ingredient::new("calabaza", 18.7, 0.60, 2900., 0.05),
            Ingredient::new("estofado", 40., 0.15, 1500., 0.15),
        ],
    }
}
