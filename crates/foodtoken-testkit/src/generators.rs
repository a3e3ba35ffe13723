//! Proptest generators for property-based testing.

use proptest::prelude::*;

use foodtoken_core::{StudentRecord, Token};

/// Generate a random token.
pub fn token() -> impl Strategy<Value = Token> {
    any::<u128>().prop_map(|_| Token::generate())
}

/// Generate a student name.
pub fn name() -> impl Strategy<Value = String> {
    "[A-Z][a-z]{2,10}( [A-Z][a-z]{1,10}){0,2}".prop_map(String::from)
}

/// Generate a college email address.
pub fn email() -> impl Strategy<Value = String> {
    "[a-z]{3,12}\\.(is|cd|cs)2[2-4]@sahyadri\\.edu\\.in".prop_map(String::from)
}

/// Generate an enrollment id in the university format.
pub fn usn() -> impl Strategy<Value = String> {
    "4SF2[2-4](IS|CD|CS)[0-9]{3}".prop_map(String::from)
}

/// Generate a class label.
pub fn class_name() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("7DS".to_string()),
        Just("ISE 3A".to_string()),
        Just("ISE 5A".to_string()),
        Just("ISE 5B".to_string()),
    ]
}

/// Generate a raw food-choice string as registration forms submit them.
pub fn food_choice() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("Veg".to_string()),
        Just("veg".to_string()),
        Just("Vegetarian".to_string()),
        Just("Non-Veg".to_string()),
        Just("non veg".to_string()),
        Just("NON-VEG".to_string()),
        Just("".to_string()),
    ]
}

/// Generate a complete registration record with a usable identity.
pub fn student_record() -> impl Strategy<Value = StudentRecord> {
    (name(), email(), usn(), class_name(), food_choice()).prop_map(
        |(name, email, usn, class, food)| StudentRecord::new(&name, &email, &usn, &class, &food),
    )
}

/// Generate a record missing one or both identity fields.
pub fn partial_identity_record() -> impl Strategy<Value = StudentRecord> {
    (
        name(),
        prop::option::of(email()),
        prop::option::of(usn()),
        class_name(),
        food_choice(),
    )
        .prop_map(|(name, email, usn, class, food)| {
            StudentRecord::new(
                &name,
                email.as_deref().unwrap_or(""),
                usn.as_deref().unwrap_or(""),
                &class,
                &food,
            )
        })
}
