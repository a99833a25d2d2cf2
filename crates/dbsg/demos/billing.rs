//! AUTO-GENERATED CODE - DO NOT EDIT!
//!
//! Stored routine stubs for `bills.billing`.
//! Generated by `dbsg` 0.4.0

#![allow(unused_imports, clippy::too_many_arguments)]
use dbsg_support::{
    Arg, CallError, CallResult, Direction, Executor, RoutineCall, SqlType,
};
/// Calls into `BILLS.BILLING`.
pub struct Billing<E> {
    executor: E,
}
impl<E: Executor> Billing<E> {
    pub fn new(executor: E) -> Self {
        Self { executor }
    }
    /// `BILLS.BILLING.CHARGE` (procedure)
    pub fn charge(
        &self,
        p_amount: Option<f64>,
        p_currency: Arg<Option<String>>,
    ) -> Result<(), CallError> {
        self.executor
            .execute(
                &RoutineCall::procedure("BILLS.BILLING.CHARGE")
                    .bind("P_AMOUNT", Direction::In, SqlType::Number, &p_amount)?
                    .bind_arg("P_CURRENCY", Direction::In, SqlType::String, &p_currency)?,
            )
            .map(|_| ())
    }
    /// `BILLS.BILLING.CHARGE` (procedure)
    pub fn charge_2(&self, p_amount: Option<f64>) -> Result<(), CallError> {
        self.executor
            .execute(
                &RoutineCall::procedure("BILLS.BILLING.CHARGE")
                    .bind("P_AMOUNT", Direction::In, SqlType::Number, &p_amount)?,
            )
            .map(|_| ())
    }
    /// `BILLS.BILLING.GET_RATE` (function)
    pub fn get_rate(
        &self,
        p_currency: Option<String>,
    ) -> Result<Option<f64>, CallError> {
        self.executor
            .execute(
                &RoutineCall::function("BILLS.BILLING.GET_RATE", SqlType::Number)
                    .bind("P_CURRENCY", Direction::In, SqlType::String, &p_currency)?,
            )?
            .returned()
    }
    /// `BILLS.BILLING.PAYROLL` (procedure)
    pub fn payroll(
        &self,
        p_rec: Option<dbsg_support::Value>,
    ) -> Result<CallResult, CallError> {
        self.executor
            .execute(
                &RoutineCall::procedure("BILLS.BILLING.PAYROLL")
                    .out("OUT_PAYROLL_ID", SqlType::Number)
                    .bind("P_REC", Direction::In, SqlType::Object, &p_rec)?,
            )
    }
}
