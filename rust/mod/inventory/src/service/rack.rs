use tracing::{debug, info};

use granthalaya_core::{now_rfc3339, ServiceError};
use granthalaya_kv::WriteBatch;

use crate::code::normalize_rack_id;
use crate::model::{NewRack, Rack};

use super::product::canonical_code;
use super::{invalid, keys, to_json, InventoryService, MAX_COMMIT_ATTEMPTS};

impl InventoryService {
    pub fn create_rack(&self, input: NewRack) -> Result<Rack, ServiceError> {
        let rack_id = normalize_rack_id(&input.rack_id).map_err(invalid)?;
        let name = input.name.trim();
        if name.is_empty() {
            return Err(ServiceError::Validation("rack name must not be empty".into()));
        }

        let now = now_rfc3339();
        let rack = Rack {
            rack_id: rack_id.clone(),
            name: name.to_string(),
            section: input.section.filter(|s| !s.trim().is_empty()),
            shelf: input.shelf.filter(|s| !s.trim().is_empty()),
            product_codes: Vec::new(),
            created_at: now.clone(),
            updated_at: now,
        };

        let mut batch = WriteBatch::new();
        batch
            .expect_absent(keys::rack(&rack_id))
            .put(keys::rack(&rack_id), to_json(&rack)?);
        if !self.commit(&batch)? {
            return Err(ServiceError::Conflict(format!("rack {rack_id} already exists")));
        }

        info!(%rack_id, "rack created");
        Ok(rack)
    }

    pub fn get_rack(&self, rack_id: &str) -> Result<Rack, ServiceError> {
        let rack_id = normalize_rack_id(rack_id).map_err(invalid)?;
        self.get_json(&keys::rack(&rack_id))?
            .ok_or_else(|| ServiceError::NotFound(format!("rack {rack_id} not found")))
    }

    /// All racks, ordered by rack id.
    pub fn list_racks(&self) -> Result<Vec<Rack>, ServiceError> {
        self.scan_json(keys::RACK_PREFIX)
    }

    /// Shelve a product on a rack, taking it off whatever rack held it
    /// before. Assigning a product to the rack it is already on changes
    /// nothing.
    pub fn assign_to_rack(&self, rack_id: &str, product_code: &str) -> Result<Rack, ServiceError> {
        let rack_id = normalize_rack_id(rack_id).map_err(invalid)?;
        let code = canonical_code(product_code)?;

        for attempt in 1..=MAX_COMMIT_ATTEMPTS {
            let (mut rack, rack_raw) = self
                .get_doc::<Rack>(&keys::rack(&rack_id))?
                .ok_or_else(|| ServiceError::NotFound(format!("rack {rack_id} not found")))?;
            let (mut product, product_raw) = self.product_doc_by_code(&code)?;

            if product.rack_id.as_deref() == Some(rack_id.as_str()) && rack.holds(&code) {
                return Ok(rack);
            }

            let now = now_rfc3339();
            let mut batch = WriteBatch::new();

            if let Some(previous) = product.rack_id.as_deref().filter(|r| *r != rack_id) {
                if let Some((mut old_rack, old_raw)) = self.get_doc::<Rack>(&keys::rack(previous))? {
                    old_rack.product_codes.retain(|c| c != &code);
                    old_rack.updated_at = now.clone();
                    batch
                        .expect_value(keys::rack(previous), Some(old_raw))
                        .put(keys::rack(previous), to_json(&old_rack)?);
                }
            }

            if !rack.holds(&code) {
                rack.product_codes.push(code.clone());
            }
            rack.updated_at = now.clone();
            product.rack_id = Some(rack_id.clone());
            product.updated_at = now;

            batch
                .expect_value(keys::rack(&rack_id), Some(rack_raw))
                .expect_value(keys::product(&product.id), Some(product_raw))
                .put(keys::rack(&rack_id), to_json(&rack)?)
                .put(keys::product(&product.id), to_json(&product)?);

            if self.commit(&batch)? {
                info!(%rack_id, %code, "product assigned to rack");
                return Ok(rack);
            }
            debug!(%rack_id, %code, attempt, "rack assignment lost a race, retrying");
        }

        Err(ServiceError::Conflict(format!(
            "rack {rack_id} is being modified concurrently, retry the assignment"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::ProductType;
    use crate::model::NewProduct;
    use crate::service::testing::fixture;

    fn new_rack(id: &str) -> NewRack {
        NewRack {
            rack_id: id.into(),
            name: format!("Rack {id}"),
            section: Some("Books".into()),
            shelf: None,
        }
    }

    fn book(svc: &InventoryService, name: &str) -> String {
        let input = NewProduct {
            product_type: ProductType::Book,
            name: name.into(),
            price: 120.0,
            stock_quantity: 3,
            category: String::new(),
            barcode: None,
            sequence: None,
        };
        svc.create_product(input, None).unwrap().product_code.unwrap()
    }

    #[test]
    fn create_normalizes_id_and_rejects_duplicates() {
        let f = fixture();
        let rack = f.svc.create_rack(new_rack("a3")).unwrap();
        assert_eq!(rack.rack_id, "RACK-A3");

        let err = f.svc.create_rack(new_rack("RACK-A3")).unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));

        assert!(matches!(
            f.svc.create_rack(new_rack("a 3")),
            Err(ServiceError::Validation(_))
        ));
        assert_eq!(f.svc.get_rack("rack-a3").unwrap(), rack);
        assert!(matches!(f.svc.get_rack("B1"), Err(ServiceError::NotFound(_))));
    }

    #[test]
    fn list_is_ordered_by_id() {
        let f = fixture();
        f.svc.create_rack(new_rack("B1")).unwrap();
        f.svc.create_rack(new_rack("A3")).unwrap();
        let ids: Vec<String> = f.svc.list_racks().unwrap().into_iter().map(|r| r.rack_id).collect();
        assert_eq!(ids, vec!["RACK-A3", "RACK-B1"]);
    }

    #[test]
    fn assign_is_idempotent() {
        let f = fixture();
        f.svc.create_rack(new_rack("A3")).unwrap();
        let code = book(&f.svc, "Gita");

        let rack = f.svc.assign_to_rack("A3", &code).unwrap();
        assert_eq!(rack.product_codes, vec![code.clone()]);

        let writes = f.store.writes();
        let again = f.svc.assign_to_rack("RACK-A3", &code.to_lowercase()).unwrap();
        assert_eq!(again.product_codes, vec![code.clone()]);
        assert_eq!(f.store.writes(), writes);

        let product = f.svc.get_product_by_code(&code).unwrap();
        assert_eq!(product.rack_id.as_deref(), Some("RACK-A3"));
    }

    #[test]
    fn reassign_moves_product_between_racks() {
        let f = fixture();
        f.svc.create_rack(new_rack("A3")).unwrap();
        f.svc.create_rack(new_rack("B1")).unwrap();
        let code = book(&f.svc, "Gita");

        f.svc.assign_to_rack("A3", &code).unwrap();
        f.svc.assign_to_rack("B1", &code).unwrap();

        assert!(f.svc.get_rack("A3").unwrap().product_codes.is_empty());
        assert_eq!(f.svc.get_rack("B1").unwrap().product_codes, vec![code.clone()]);
        assert_eq!(
            f.svc.get_product_by_code(&code).unwrap().rack_id.as_deref(),
            Some("RACK-B1")
        );
    }

    #[test]
    fn deleting_a_product_takes_it_off_its_rack() {
        let f = fixture();
        f.svc.create_rack(new_rack("A3")).unwrap();
        let gita = book(&f.svc, "Gita");
        let puranas = book(&f.svc, "Puranas");
        f.svc.assign_to_rack("A3", &gita).unwrap();
        f.svc.assign_to_rack("A3", &puranas).unwrap();

        f.svc.delete_product(&gita).unwrap();
        assert_eq!(f.svc.get_rack("A3").unwrap().product_codes, vec![puranas]);
    }

    #[test]
    fn assign_unknown_targets() {
        let f = fixture();
        f.svc.create_rack(new_rack("A3")).unwrap();
        assert!(matches!(
            f.svc.assign_to_rack("A3", "GG-BK-NOPE-00001"),
            Err(ServiceError::NotFound(_))
        ));
        let code = book(&f.svc, "Gita");
        assert!(matches!(
            f.svc.assign_to_rack("Z9", &code),
            Err(ServiceError::NotFound(_))
        ));
    }
}
