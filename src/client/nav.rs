//! Navigation bar model and page layout rule.

use super::Route;

/// Path prefixes rendered without the navigation bar.
const BARE_PREFIXES: [&str; 2] = ["/auth", "/dashboard"];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Link {
    pub title: String,
    pub url: String,
}

impl Link {
    fn to(title: &str, route: Route) -> Self {
        Self {
            title: title.to_owned(),
            url: route.path().to_owned(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Logo {
    pub url: String,
    pub src: String,
    pub alt: String,
    pub title: Option<String>,
    pub width: u32,
    pub height: u32,
}

/// Menu entry, optionally holding a submenu.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MenuItem {
    pub title: String,
    pub url: String,
    pub description: Option<String>,
    pub items: Vec<MenuItem>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Navbar {
    pub logo: Logo,
    pub menu: Vec<MenuItem>,
    pub login: Link,
    pub register: Link,
}

impl Default for Navbar {
    fn default() -> Self {
        Self {
            logo: Logo {
                url: Route::Landing.path().to_owned(),
                src: "/next.svg".into(),
                alt: "HRIS logo".into(),
                title: None,
                width: 120,
                height: 20,
            },
            menu: Vec::new(),
            login: Link::to("Login", Route::Login),
            register: Link::to("Sign up", Route::Register),
        }
    }
}

impl Navbar {
    /// Every link of the bar, logo first.
    pub fn links(&self) -> Vec<Link> {
        fn flatten(items: &[MenuItem], links: &mut Vec<Link>) {
            for item in items {
                links.push(Link {
                    title: item.title.clone(),
                    url: item.url.clone(),
                });
                flatten(&item.items, links);
            }
        }

        let mut links = vec![Link {
            title: self.logo.title.clone().unwrap_or_else(|| self.logo.alt.clone()),
            url: self.logo.url.clone(),
        }];
        flatten(&self.menu, &mut links);
        links.push(self.login.clone());
        links.push(self.register.clone());
        links
    }
}

/// Whether the page at `path` renders the navigation bar.
// The React layout's `startsWith('/auth', '/dashboard')` only tests `/auth`
// as a raw prefix. Both prefixes are matched here, per path segment.
pub fn shows_navbar(path: &str) -> bool {
    !BARE_PREFIXES.iter().any(|prefix| {
        path.strip_prefix(prefix)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shows_navbar() {
        assert!(shows_navbar("/"));
        assert!(shows_navbar("/about"));
        assert!(shows_navbar("/authors"));

        assert!(!shows_navbar("/auth"));
        assert!(!shows_navbar("/auth/login"));
        assert!(!shows_navbar("/auth/register"));
        assert!(!shows_navbar("/dashboard"));
        assert!(!shows_navbar("/dashboard/employees"));
    }

    #[test]
    fn test_default_navbar() {
        let navbar = Navbar::default();
        assert_eq!(navbar.logo.url, "/");
        assert_eq!(navbar.login, Link::to("Login", Route::Login));
        assert_eq!(navbar.register.title, "Sign up");
        assert_eq!(navbar.register.url, "/auth/register");
    }

    #[test]
    fn test_links_include_submenus() {
        let navbar = Navbar {
            menu: vec![MenuItem {
                title: "Product".into(),
                url: "#".into(),
                description: None,
                items: vec![MenuItem {
                    title: "Payroll".into(),
                    url: "/payroll".into(),
                    description: Some("Pay your people".into()),
                    items: Vec::new(),
                }],
            }],
            ..Default::default()
        };

        let urls: Vec<_> = navbar.links().into_iter().map(|l| l.url).collect();
        assert_eq!(urls, ["/", "#", "/payroll", "/auth/login", "/auth/register"]);
    }
}
