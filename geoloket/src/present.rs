//! Contrat de présentation : les pipelines émettent des données simples,
//! la couche d'affichage en fait du balisage.

use registers::{BuildingRecord, CompanyRecord};

/// Niveau d'un message de statut
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Success,
    Error,
}

/// Section « bâtiment » du panneau d'information
#[derive(Debug, Clone)]
pub enum BuildingSection {
    /// Pand trouvé
    Found(BuildingRecord),
    /// Aucun pand à cet endroit (pas une erreur)
    NotFound,
    /// Échec de la requête
    Error(String),
}

/// Section « bedrijven » du panneau d'information
///
/// Une liste est toujours accompagnée de l'identifiant du pand qui l'a
/// produite.
#[derive(Debug, Clone)]
pub enum CompanySection {
    /// Recherche en cours, la liste précédente est retirée
    Loading,
    /// Aucun pand sélectionné (pand introuvable ou requête en échec)
    NoBuilding,
    /// Le pand n'a pas d'identifiant, aucune requête envoyée
    NoIdentifier,
    /// Aucun bedrijf dans ce pand
    Empty { building_id: String },
    Companies {
        building_id: String,
        companies: Vec<CompanyRecord>,
    },
    Error(String),
}

impl CompanySection {
    /// Message affiché à la place d'une liste vide
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Loading => Some("Loading company information..."),
            Self::NoBuilding => Some("No building selected"),
            Self::NoIdentifier => Some("No building identifier available for company lookup"),
            Self::Empty { .. } => Some("No companies registered in this building"),
            Self::Companies { .. } => None,
            Self::Error(msg) => Some(msg),
        }
    }

    pub fn companies(&self) -> &[CompanyRecord] {
        match self {
            Self::Companies { companies, .. } => companies,
            _ => &[],
        }
    }
}

/// Couche d'affichage
pub trait Presenter {
    /// Message transitoire (bandeau de statut)
    fn status(&self, level: StatusLevel, message: &str);

    fn building(&self, section: &BuildingSection);

    fn companies(&self, section: &CompanySection);

    /// Texte du résultat de mesure courant (None = effacé)
    fn measurement(&self, text: Option<&str>);
}

/// Affichage console pour la CLI
#[derive(Debug, Default)]
pub struct ConsolePresenter;

impl Presenter for ConsolePresenter {
    fn status(&self, level: StatusLevel, message: &str) {
        match level {
            StatusLevel::Error => eprintln!("[error] {message}"),
            StatusLevel::Success => println!("[ok] {message}"),
            StatusLevel::Info => println!("[info] {message}"),
        }
    }

    fn building(&self, section: &BuildingSection) {
        println!("\n{}", "=".repeat(60));
        match section {
            BuildingSection::Found(building) => {
                println!("{}", building.label);
                println!("{}", "=".repeat(60));
                for (label, value) in &building.attributes {
                    println!("  {:<28} {}", label, value);
                }
            }
            BuildingSection::NotFound => println!("No building found at this location"),
            BuildingSection::Error(msg) => println!("Error loading building data: {msg}"),
        }
    }

    fn companies(&self, section: &CompanySection) {
        if matches!(section, CompanySection::Loading) {
            return;
        }
        println!("\n--- COMPANIES ---");
        if let Some(msg) = section.message() {
            println!("  {msg}");
            return;
        }
        for company in section.companies() {
            println!("  {} [{}]", company.name, company.status_label());
            println!(
                "    KVK: {} | Establishment: {}",
                company.kvk_number, company.establishment_number
            );
            println!("    Activity: {}", company.activity);
            println!("    Legal form: {}", company.legal_form);
            println!("    Address: {}", company.address_label());
        }
    }

    fn measurement(&self, text: Option<&str>) {
        match text {
            Some(text) => println!("Measurement: {text}"),
            None => println!("Measurement cleared"),
        }
    }
}
