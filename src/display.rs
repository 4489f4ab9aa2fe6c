use std::fmt::Write;

use crate::board::{Board, Bucket, Person};

/// Formats a request as `Name (Location) x N`, starring priority requests
pub fn format_person(person: &Person) -> String {
    let marker = if person.priority { "* " } else { "" };
    format!(
        "{}{} ({}) x {}",
        marker, person.name, person.location, person.group_size
    )
}

fn render_bucket(out: &mut String, bucket: &Bucket) {
    let counts = bucket.counts();
    let _ = writeln!(out, "\n=== {} ===", bucket.id.label());
    let _ = writeln!(
        out,
        "Requests: {}  Total People: {}",
        counts.requests, counts.total_people
    );
    if bucket.is_empty() {
        let _ = writeln!(out, "  [EMPTY]");
    }
    for person in &bucket.items {
        let _ = writeln!(out, "  - {}", format_person(person));
    }
}

/// Renders every bucket in board order
pub fn render_board(board: &Board) -> String {
    let mut out = String::new();
    for bucket in board.buckets() {
        render_bucket(&mut out, bucket);
    }
    out
}

pub fn print_board(board: &Board) {
    println!("{}", render_board(board));
    println!(
        "Total requests: {}  Total people: {}",
        board.total_requests(),
        board.total_people()
    );
}
