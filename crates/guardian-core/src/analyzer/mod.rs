pub mod heal;
pub mod parser;
pub mod semantic;
pub mod structural;
pub mod tester;
