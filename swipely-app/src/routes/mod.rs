pub mod deck;
pub mod health;
pub mod matches;
pub mod profile;
pub mod session;
pub mod swipes;

#[cfg(test)]
mod tests;
