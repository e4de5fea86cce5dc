//! Prompt text for each phase. Rendered with minijinja.

pub(super) const GENERAL_SYSTEM: &str = "\
You are an experienced TypeScript and Playwright scraper developer.
Read the user's feedback on generated scraper code and recommend concrete fixes.
Cover broken selectors and logic errors, missing or malformed data fields, and
product ranges or pages the scraper does not reach. Rank the fixes by impact and
include code where it helps.";

pub(super) const ANALYSIS_SYSTEM: &str = "\
You are an experienced scraper developer who analyses e-commerce sites.
Revise the site analysis below using the user's feedback: adjust the collection
strategy (API or page scraping), add or drop sitemaps, brand, category and
product pages, correct API endpoint details and improve the product selectors.
Return a complete revised analysis.";

pub(super) const URL_COLLECTION_SYSTEM: &str = "\
You are an experienced TypeScript and Playwright scraper developer.
Revise the URL discovery code below using the user's feedback. Fix pagination,
make selectors robust and handle errors. Return the complete collectProductUrls
function with its signature unchanged.";

pub(super) const DATA_VALIDATION_SYSTEM: &str = "\
You are an experienced TypeScript and Playwright scraper developer.
Revise the product extraction code below using the user's feedback. Fix or add the
fields the user mentions, clean prices and identifiers, and handle layout
variations. Return the complete extractProductData function with its signature
unchanged.";

pub(super) const ASSEMBLY_SYSTEM: &str = "\
You are an experienced TypeScript and Playwright scraper developer.
Revise the assembled scraper script below using the user's feedback and its
validation result. Keep the metadata and scrape commands working and make sure
the script type-checks. Return the sections to change together with their
replacement code.";

pub(super) const GENERAL_USER: &str = r#"Please help me improve the {{ phase }} code of my scraper based on user feedback.

CURRENT CODE:
```typescript
{{ code }}
```

USER FEEDBACK:
{{ feedback }}

List the problems the feedback points at, the code changes that fix each one, and any further improvements. If the feedback is too vague to act on, say what information is missing."#;

pub(super) const ANALYSIS_USER: &str = r#"Please revise the site analysis for {{ url }} based on user feedback.

CURRENT ANALYSIS:
- Proposed strategy: {{ strategy }}
- Strategy description: {{ strategy_description }}
- Sitemaps: {{ sitemaps }}
- Brand pages: {{ brand_pages }}
- Category pages: {{ category_pages }}
- Product listing pages: {{ product_pages }}
{% if api_endpoints %}- API endpoints: {{ api_endpoints | join(", ") }}{% else %}- No API endpoints identified.{% endif %}

USER FEEDBACK:
{{ feedback }}

Return the revised strategy, the updated page lists, corrected API endpoint details and updated product selectors."#;

pub(super) const URL_COLLECTION_USER: &str = r#"Please revise the URL discovery code based on user feedback.

CURRENT CODE:
```typescript
{{ code }}
```

EXECUTION RESULTS:
- Total URLs collected: {{ total_count }}
- Sample URLs: {{ sample_urls }}

USER FEEDBACK:
{{ feedback }}

Return an updated collectProductUrls function that applies the feedback, keeps the same signature and comments on what changed."#;

pub(super) const DATA_VALIDATION_USER: &str = r#"Please revise the product extraction code based on user feedback.

CURRENT CODE:
```typescript
{{ code }}
```

EXECUTION RESULTS:
- Extracted data for {{ product_count }} products

SAMPLE EXTRACTED DATA:
{{ samples }}

USER FEEDBACK:
{{ feedback }}

Return an updated extractProductData function that applies the feedback, keeps the same signature and comments on what changed."#;

pub(super) const ASSEMBLY_USER: &str = r#"Please revise this assembled scraper script based on user feedback.

VALIDATION RESULT:
{% if valid %}- Script passed validation{% else %}- Validation failed: {{ validation_error }}{% endif %}

USER FEEDBACK:
{{ feedback }}

SCRIPT:
```typescript
{{ script }}
```

For each change, show the section to modify, its replacement and how it addresses the feedback."#;
