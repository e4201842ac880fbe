use fnkit_lib::repositories::Repositories;
use fnkit_lib::templates::Templates;

/// Templates from the embedded repository only.
pub fn embedded_templates() -> Templates {
  Templates::new(Repositories::new(None, None))
}
