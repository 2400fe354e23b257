//! Link do chamado no sistema de atendimento externo

use fila::Ticket;

const PLACEHOLDER: &str = "{numero}";

#[derive(Debug, Clone, Default)]
pub struct TrackerLinks {
    template: Option<String>,
}

impl TrackerLinks {
    pub fn new(template: Option<String>) -> Self {
        let template = template.filter(|t| t.contains(PLACEHOLDER));
        Self { template }
    }

    /// URL para o número do chamado; `None` sem template ou sem número
    pub fn link_for(&self, ticket: &Ticket) -> Option<String> {
        let template = self.template.as_ref()?;
        let reference = ticket.reference.as_deref()?.trim();
        if reference.is_empty() {
            return None;
        }
        Some(template.replace(PLACEHOLDER, &urlencoding::encode(reference)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEMPLATE: &str = "https://suporte.exemplo.com/hd/cadastro_chamado.php?cdchamado={numero}";

    #[test]
    fn test_link_for_reference() {
        let links = TrackerLinks::new(Some(TEMPLATE.to_string()));
        let ticket = fila::Ticket::pending(1u64, Some("48213"));
        assert_eq!(
            links.link_for(&ticket).as_deref(),
            Some("https://suporte.exemplo.com/hd/cadastro_chamado.php?cdchamado=48213")
        );

        let odd = fila::Ticket::pending(2u64, Some("A B&C"));
        assert!(links.link_for(&odd).unwrap_or_default().ends_with("cdchamado=A%20B%26C"));
    }

    #[test]
    fn test_no_link_without_reference_or_template() {
        let links = TrackerLinks::new(Some(TEMPLATE.to_string()));
        assert_eq!(links.link_for(&fila::Ticket::pending(1u64, None)), None);

        let ticket = fila::Ticket::pending(1u64, Some("48213"));
        assert_eq!(TrackerLinks::new(None).link_for(&ticket), None);
        // template sem marcador é ignorado
        assert_eq!(TrackerLinks::new(Some("https://x".into())).link_for(&ticket), None);
    }
}
