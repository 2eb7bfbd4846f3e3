mod eligibility;
mod rules;

pub use eligibility::eligibility_status;
pub use rules::{
    apply_contact_outcome, contact_side_effects, home_visit_required, untried_channels, SideEffect,
};
