pub mod schwab;
