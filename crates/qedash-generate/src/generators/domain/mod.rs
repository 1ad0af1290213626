use crate::generators::GeneratorRegistry;

pub mod curriculum;
pub mod experience;
pub mod people;

pub fn register(registry: &mut GeneratorRegistry) {
    people::register(registry);
    curriculum::register(registry);
    experience::register(registry);
}
