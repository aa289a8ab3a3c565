use creg_derive::registry_error;

#[registry_error]
pub struct DemoError {
    message: String,
}

fn main() {}
