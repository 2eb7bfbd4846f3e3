pub mod followup;
