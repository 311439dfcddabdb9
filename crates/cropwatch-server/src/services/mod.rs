pub mod farms;
pub mod health_check;
pub mod plants;
