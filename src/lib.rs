//! Structural interface diffing and resolution core for the Myxa package
//! manager.
//!
//! A [`Package`] declares a tree of [`Module`]s holding [`Member`]s (funcs,
//! structs, enums) built from [`Type`]. Two versions of the same interface
//! are compared with [`diff`], which classifies every change by
//! [`Category`] and from that derives the [`Version`] bump a publisher is
//! required to make (`required_bump`). [`Resolver`] and [`UpdatePlanner`]
//! use a *restricted* form of that same diff ([`diff_restricted`]) to admit
//! dependency candidates whose major version changed but whose
//! actually-used surface didn't break. [`publish`] is the single gate that
//! ties validation, diffing, and the required-bump check together before a
//! [`Package`] snapshot lands in the [`Index`].

pub mod diff;
pub mod error;
pub mod index;
pub mod member;
pub mod module;
pub mod package;
pub mod publish;
pub mod resolver;
pub mod types;
pub mod update;
pub mod version;

pub use diff::{diff, diff_restricted, is_breaking, required_bump, Category, Change, Diff};
pub use error::{MyxaError, MyxaResult};
pub use index::Index;
pub use member::{Member, Param};
pub use module::Module;
pub use package::{validate, Dep, DepReq, Package, PackageInfo};
pub use publish::publish;
pub use resolver::{Resolver, ResolverLimits};
pub use types::{Primitive, Type};
pub use update::UpdatePlanner;
pub use version::Version;

#[cfg(test)]
mod seed_scenarios {
    use crate::diff::{diff, is_breaking};
    use crate::index::Index;
    use crate::member::{Member, Param};
    use crate::package::{Dep, DepReq, Package};
    use crate::publish::publish;
    use crate::resolver::Resolver;
    use crate::types::Type;
    use crate::update::UpdatePlanner;
    use crate::version::Version;

    #[test]
    fn scenario_1_init_and_publish() {
        let mut index = Index::new();
        let mut pkg = Package::init("euler", "number theory utilities");
        pkg.root_module.add_member(
            "is_prime",
            Member::Func {
                params: vec![Param::new("n", Type::int())],
                ret: Type::bool(),
            },
        );
        assert_eq!(pkg.info.version, Version::INITIAL);

        publish(&pkg, &mut index).unwrap();
        assert_eq!(index.latest("euler").unwrap().info.version, Version::new(1, 0));
    }

    #[test]
    fn scenario_2_added_parameter_forces_major_bump() {
        let mut index = Index::new();
        let mut v1 = Package::init("euler", "d");
        v1.root_module.add_member(
            "is_prime",
            Member::Func {
                params: vec![Param::new("n", Type::int())],
                ret: Type::bool(),
            },
        );
        publish(&v1, &mut index).unwrap();

        let mut v1_1 = v1.clone();
        v1_1.root_module.add_member(
            "is_prime",
            Member::Func {
                params: vec![Param::new("n", Type::int()), Param::new("base", Type::int())],
                ret: Type::bool(),
            },
        );
        let changes = diff(&v1, &v1_1);
        assert!(is_breaking(&changes));
        let err = publish(&v1_1, &mut index).unwrap_err();
        assert!(matches!(err, crate::error::MyxaError::VersionBumpRequired { .. }));

        v1_1.info.version = Version::new(2, 0);
        publish(&v1_1, &mut index).unwrap();
        assert_eq!(index.latest("euler").unwrap().info.version, Version::new(2, 0));
    }

    #[test]
    fn scenario_3_added_struct_field_is_breaking() {
        use indexmap::IndexMap;

        let mut v1_fields = IndexMap::new();
        v1_fields.insert("x".to_string(), Type::int());
        let mut v1 = Package::init("geo", "d");
        v1.root_module
            .add_member("Point", Member::Struct { fields: v1_fields });

        let mut v2_fields = IndexMap::new();
        v2_fields.insert("x".to_string(), Type::int());
        v2_fields.insert("y".to_string(), Type::int());
        let mut v2 = v1.clone();
        v2.root_module
            .add_member("Point", Member::Struct { fields: v2_fields });

        let changes = diff(&v1, &v2);
        assert!(is_breaking(&changes));
    }

    fn f(ret: Type) -> Member {
        Member::Func {
            params: vec![],
            ret,
        }
    }

    #[test]
    fn scenario_4_update_selectively_crosses_major() {
        let mut index = Index::new();
        let mut lib1 = Package::init("strutil", "d");
        lib1.root_module.add_member("trim", f(Type::str()));
        lib1.root_module.add_member("pad", f(Type::str()));
        publish(&lib1, &mut index).unwrap();

        let mut lib2 = lib1.clone();
        lib2.info.version = Version::new(2, 0);
        lib2.root_module.add_member("pad", f(Type::int()));
        publish(&lib2, &mut index).unwrap();

        let mut app = Package::init("app", "d");
        app.add_requirement(DepReq::new("strutil", Version::new(1, 0)));
        app.deps
            .insert("strutil".to_string(), Dep::new("strutil", Version::new(1, 0)));
        app.root_module
            .add_member("use_trim", f(Type::reference("strutil.trim")));

        let changed = UpdatePlanner::new(&index).update(&mut app).unwrap();
        assert!(changed, "app only uses the unbroken member, should cross major");
        assert_eq!(app.deps["strutil"].version, Version::new(2, 0));
    }

    #[test]
    fn scenario_5_update_stays_when_both_members_used() {
        let mut index = Index::new();
        let mut lib1 = Package::init("strutil", "d");
        lib1.root_module.add_member("trim", f(Type::str()));
        lib1.root_module.add_member("pad", f(Type::str()));
        publish(&lib1, &mut index).unwrap();

        let mut lib2 = lib1.clone();
        lib2.info.version = Version::new(2, 0);
        lib2.root_module.add_member("pad", f(Type::int()));
        publish(&lib2, &mut index).unwrap();

        let mut app = Package::init("app", "d");
        app.add_requirement(DepReq::new("strutil", Version::new(1, 0)));
        app.deps
            .insert("strutil".to_string(), Dep::new("strutil", Version::new(1, 0)));
        app.root_module
            .add_member("use_trim", f(Type::reference("strutil.trim")));
        app.root_module
            .add_member("use_pad", f(Type::reference("strutil.pad")));

        let changed = UpdatePlanner::new(&index).update(&mut app).unwrap();
        assert!(!changed, "pad's breaking change is used, must not cross major");
        assert_eq!(app.deps["strutil"].version, Version::new(1, 0));
    }

    #[test]
    fn scenario_6_duplicate_publish_fails_but_fresh_major_does_not() {
        let mut index = Index::new();
        let pkg = Package::init("dup", "d");
        publish(&pkg, &mut index).unwrap();

        let err = publish(&pkg, &mut index).unwrap_err();
        assert!(matches!(err, crate::error::MyxaError::VersionBumpRequired { .. }));

        // A second, unrelated name's own first publish at 1.0 is unaffected.
        let other = Package::init("other", "d");
        publish(&other, &mut index).unwrap();
        assert_eq!(index.latest("other").unwrap().info.version, Version::new(1, 0));

        // Resolver can still seed and lock a fresh app against both.
        let mut app = Package::init("app", "d");
        app.add_requirement(DepReq::new("dup", Version::new(1, 0)));
        app.add_requirement(DepReq::new("other", Version::new(1, 0)));
        let resolver = Resolver::new(&index);
        app.deps = resolver.lock(&app).unwrap();
        assert_eq!(app.deps["dup"].version, Version::new(1, 0));
        assert_eq!(app.deps["other"].version, Version::new(1, 0));
    }
}
