//! Built-in functions

pub mod date;
pub mod info;
pub mod logical;
pub mod math;
pub mod text;

use crate::error::FormulaResult;
use crate::evaluator::{EvaluationContext, FormulaValue};
use std::collections::HashMap;
use std::sync::OnceLock;

/// Function implementation signature.
///
/// Arguments arrive evaluated; range arguments are [`FormulaValue::Array`].
pub type FunctionImpl = fn(&[FormulaValue], &EvaluationContext) -> FormulaResult<FormulaValue>;

pub struct FunctionDef {
    /// Uppercase name
    pub name: &'static str,
    pub min_args: usize,
    /// `None` for variadic functions
    pub max_args: Option<usize>,
    pub implementation: FunctionImpl,
}

pub struct FunctionRegistry {
    functions: HashMap<&'static str, FunctionDef>,
}

static FUNCTION_REGISTRY: OnceLock<FunctionRegistry> = OnceLock::new();

/// Built-in function by name, ignoring case
pub fn lookup_function(name: &str) -> Option<&'static FunctionDef> {
    FUNCTION_REGISTRY
        .get_or_init(FunctionRegistry::new)
        .get(name)
}

impl FunctionRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            functions: HashMap::new(),
        };
        registry.register_math_functions();
        registry.register_logical_functions();
        registry.register_text_functions();
        registry.register_date_functions();
        registry.register_info_functions();
        registry
    }

    pub fn get(&self, name: &str) -> Option<&FunctionDef> {
        self.functions.get(name.to_ascii_uppercase().as_str())
    }

    pub fn register(&mut self, def: FunctionDef) {
        self.functions.insert(def.name, def);
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.functions.keys().copied().collect();
        names.sort_unstable();
        names
    }

    fn add(&mut self, name: &'static str, min_args: usize, max_args: Option<usize>, f: FunctionImpl) {
        self.register(FunctionDef {
            name,
            min_args,
            max_args,
            implementation: f,
        });
    }

    fn register_math_functions(&mut self) {
        self.add("SUM", 1, None, math::fn_sum);
        self.add("AVERAGE", 1, None, math::fn_average);
        self.add("MIN", 1, None, math::fn_min);
        self.add("MAX", 1, None, math::fn_max);
        self.add("COUNT", 1, None, math::fn_count);
        self.add("COUNTA", 1, None, math::fn_counta);
        self.add("PRODUCT", 1, None, math::fn_product);
        self.add("ABS", 1, Some(1), math::fn_abs);
        self.add("ROUND", 2, Some(2), math::fn_round);
        self.add("INT", 1, Some(1), math::fn_int);
        self.add("MOD", 2, Some(2), math::fn_mod);
        self.add("SQRT", 1, Some(1), math::fn_sqrt);
        self.add("POWER", 2, Some(2), math::fn_power);
        self.add("SIGN", 1, Some(1), math::fn_sign);
        self.add("TRUNC", 1, Some(2), math::fn_trunc);
        self.add("PI", 0, Some(0), math::fn_pi);
    }

    fn register_logical_functions(&mut self) {
        self.add("IF", 2, Some(3), logical::fn_if);
        self.add("AND", 1, None, logical::fn_and);
        self.add("OR", 1, None, logical::fn_or);
        self.add("NOT", 1, Some(1), logical::fn_not);
        self.add("TRUE", 0, Some(0), logical::fn_true);
        self.add("FALSE", 0, Some(0), logical::fn_false);
        self.add("IFERROR", 2, Some(2), logical::fn_iferror);
    }

    fn register_text_functions(&mut self) {
        self.add("CONCATENATE", 1, None, text::fn_concatenate);
        self.add("LEN", 1, Some(1), text::fn_len);
        self.add("LEFT", 1, Some(2), text::fn_left);
        self.add("RIGHT", 1, Some(2), text::fn_right);
        self.add("MID", 3, Some(3), text::fn_mid);
        self.add("UPPER", 1, Some(1), text::fn_upper);
        self.add("LOWER", 1, Some(1), text::fn_lower);
        self.add("TRIM", 1, Some(1), text::fn_trim);
        self.add("VALUE", 1, Some(1), text::fn_value);
        self.add("TEXT", 2, Some(2), text::fn_text);
    }

    fn register_date_functions(&mut self) {
        self.add("DATE", 3, Some(3), date::fn_date);
        self.add("YEAR", 1, Some(1), date::fn_year);
        self.add("MONTH", 1, Some(1), date::fn_month);
        self.add("DAY", 1, Some(1), date::fn_day);
        self.add("TODAY", 0, Some(0), date::fn_today);
        self.add("NOW", 0, Some(0), date::fn_now);
    }

    fn register_info_functions(&mut self) {
        self.add("ISBLANK", 1, Some(1), info::fn_isblank);
        self.add("ISNUMBER", 1, Some(1), info::fn_isnumber);
        self.add("ISTEXT", 1, Some(1), info::fn_istext);
        self.add("ISERROR", 1, Some(1), info::fn_iserror);
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Single number argument, or the error value to return instead
pub(crate) fn number_arg(args: &[FormulaValue], index: usize) -> Result<f64, FormulaValue> {
    let value = args.get(index).cloned().unwrap_or(FormulaValue::Empty).scalar();
    crate::evaluator::to_number(&value).map_err(FormulaValue::Error)
}

/// Unwrap a `Result<_, FormulaValue>` inside a function body
macro_rules! try_value {
    ($e:expr) => {
        match $e {
            Ok(v) => v,
            Err(value) => return Ok(value),
        }
    };
}
pub(crate) use try_value;
