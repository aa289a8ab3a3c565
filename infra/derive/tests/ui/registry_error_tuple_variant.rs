use creg_derive::registry_error;

#[registry_error]
pub enum DemoError {
    Io(std::io::Error),
}

fn main() {}
