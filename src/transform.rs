use crate::models::{ClientProfileRow, ExtractedProfile};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Builds the `client_profiles` row for `user_id`, stamped with the current time.
pub fn transform_client_profile(user_id: Uuid, profile: &ExtractedProfile) -> ClientProfileRow {
    transform_client_profile_at(user_id, profile, Utc::now())
}

/// Same as [`transform_client_profile`] with an explicit timestamp.
///
/// Fields the legacy export cannot supply are left null, and both timestamps
/// carry `now`.
pub fn transform_client_profile_at(
    user_id: Uuid,
    profile: &ExtractedProfile,
    now: DateTime<Utc>,
) -> ClientProfileRow {
    ClientProfileRow {
        user_id,
        company_name: profile.company_name.clone(),
        website: profile.website.clone(),
        description: None,
        duns_number: profile.duns_number.clone(),
        organisation_type: profile.organisation_type.clone(),
        industry: profile.industry.clone(),
        logo_url: None,
        address1: profile.address1.clone(),
        address2: profile.address2.clone(),
        address3: profile.address3.clone(),
        country: profile.country.clone(),
        postal_code: profile.postal_code.clone(),
        phone: profile.phone.clone(),
        linkedin_url: None,
        stripe_customer_id: None,
        created_at: now,
        updated_at: now,
    }
}
