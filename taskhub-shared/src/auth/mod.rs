/// Authentication primitives
///
/// - `token`: session token signing, verification, and issuance
/// - `password`: Argon2id hashing and the account password policy
pub mod password;
pub mod token;
