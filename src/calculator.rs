use thiserror::Error;

/// 計算エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalcError {
    #[error("ゼロ除算エラー: Division by zero is not allowed.")]
    DivisionByZero,
    // NaN や無限大
    #[error("計算結果が無効です（NaN または 無限大）")]
    NonFinite,
}

/// 四則演算の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl Operation {
    pub fn name(self) -> &'static str {
        match self {
            Operation::Add => "add",
            Operation::Subtract => "subtract",
            Operation::Multiply => "multiply",
            Operation::Divide => "divide",
        }
    }
}

pub struct Calculator;

impl Calculator {
    pub fn apply(operation: Operation, a: f64, b: f64) -> Result<f64, CalcError> {
        if !a.is_finite() || !b.is_finite() {
            return Err(CalcError::NonFinite);
        }

        let result = match operation {
            Operation::Add => a + b,
            Operation::Subtract => a - b,
            Operation::Multiply => a * b,
            Operation::Divide => {
                if b == 0.0 {
                    return Err(CalcError::DivisionByZero);
                }
                a / b
            }
        };

        // オーバーフローのチェック
        if !result.is_finite() {
            return Err(CalcError::NonFinite);
        }

        Ok(result)
    }
}
