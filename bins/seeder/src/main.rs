//! Database seeder for Lavo development and testing.
//!
//! Seeds a few staff members and an opening float so a fresh database has
//! something to close. Safe to run repeatedly.
//!
//! Usage: cargo run --bin seeder

use lavo_core::cash::{MovementType, NewMovement};
use lavo_db::repositories::{CashRepository, CreateStaffInput, UserRepository};
use lavo_shared::AppConfig;
use lavo_shared::types::UserId;
use rust_decimal_macros::dec;

/// Staff seeded for local development: (first name, last name, email).
const STAFF: [(&str, &str, &str); 3] = [
    ("Marta", "Sousa", "marta@lavo.dev"),
    ("Joao", "Pereira", "joao@lavo.dev"),
    ("Ines", "Costa", "ines@lavo.dev"),
];

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().expect("Failed to load configuration");

    println!("Connecting to database...");
    let db = lavo_db::connect_with(&config.database)
        .await
        .expect("Failed to connect to database");

    let users = UserRepository::new(db.clone());
    let cash = CashRepository::new(db);

    println!("Seeding staff...");
    let mut first_staff = None;
    for (first_name, last_name, email) in STAFF {
        let existing = users
            .find_by_email(email)
            .await
            .expect("Failed to look up staff");

        let user = if let Some(user) = existing {
            println!("  {email} already exists, skipping...");
            user
        } else {
            println!("  Creating {email}");
            users
                .create_staff(CreateStaffInput {
                    first_name: first_name.to_string(),
                    last_name: last_name.to_string(),
                    email: email.to_string(),
                })
                .await
                .expect("Failed to create staff")
        };
        first_staff.get_or_insert(user.id);
    }

    println!("Seeding opening float...");
    let has_history = cash
        .last_closure()
        .await
        .expect("Failed to read closures")
        .is_some();
    let has_open = !cash
        .unclosed_movements()
        .await
        .expect("Failed to read movements")
        .is_empty();

    if has_history || has_open {
        println!("  Ledger already in use, skipping...");
    } else {
        let opening = cash
            .create_movement(NewMovement {
                movement_type: MovementType::Opening,
                amount: dec!(100.00),
                note: Some("Seeded opening float".to_string()),
                person_user_id: first_staff.map(UserId::from_uuid),
                person: None,
                movement_at: None,
            })
            .await
            .expect("Failed to create opening movement");
        println!("  Created opening movement {}", opening.movement.id);
    }

    println!("Seeding complete!");
}
