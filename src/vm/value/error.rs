use super::procedure::Arity;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuntimeError {
    #[error("Operands must be two numbers, two strings, or a combination of strings and numbers.")]
    InvalidAddition,
    #[error("Operands must be numbers.")]
    OperandsMustBeNumbers,
    #[error("Operand must be a number.")]
    OperandMustBeNumber,
    #[error("Undefined variable '{0}'.")]
    UndefinedVariable(String),
    #[error("Undefined property '{0}'.")]
    UndefinedProperty(String),
    #[error("Only instances have properties.")]
    NoProperties,
    #[error("Only instances have fields.")]
    NoFields,
    #[error("Only instances have methods.")]
    NoMethods,
    #[error("Superclass must be a class.")]
    InvalidSuperclass,
    #[error("Can only call functions and classes.")]
    NonCallable,
    #[error("Expected {0} arguments but got {1}.")]
    ArityMismatch(Arity, usize),
    #[error("Stack overflow.")]
    StackOverflow,
    #[error("{0}")]
    NativeError(String),
}

pub fn undefined_variable<S: Into<String>>(name: S) -> RuntimeError {
    RuntimeError::UndefinedVariable(name.into())
}

pub fn undefined_property<S: Into<String>>(name: S) -> RuntimeError {
    RuntimeError::UndefinedProperty(name.into())
}

pub fn arity_mismatch(arity: Arity, arg_count: usize) -> RuntimeError {
    RuntimeError::ArityMismatch(arity, arg_count)
}

pub fn native_error<S: Into<String>>(message: S) -> RuntimeError {
    RuntimeError::NativeError(message.into())
}
