//! Rule script sources, one per alert kind.
//!
//! `{{ }}` expressions belong to the rule engine and are evaluated when an
//! alert fires; only `[[ ]]` fields and `[% %]` blocks are filled in here.

pub const MEMORY_USAGE: &str = r#"batch
    |	query('''
				select mean(value)/1024/1024 as value from "opentsdb"."autogen"."[[ metric ]]" where "app"='[[ app ]]' and "dyno" [[ dyno_filter ]]
    	''')
        .period([[ window ]])
        .every([[ every ]])
        .groupBy('app','dyno')
    |	eval(lambda: ceil("value")).as('rvalue').keep('value','rvalue')
    |	alert()
        .crit(lambda: "value" > [[ crit ]])
        .warn(lambda: "value" > [[ warn ]])
        .stateChangesOnly()
        [% if slack %]
        .slack()
        .channel('[[ slack ]]')
        [% endif %]
        .message('Memory is {{ .Level }} for {{ .Group }} : {{ index .Fields "rvalue" }} MB - limits [[ warn ]]/[[ crit ]]')
        .details('''
					<h3>{{ .Message }}</h3>
					<h3>Value: {{ index .Fields "rvalue" }}</h3>
				''')
        [% for email in emails %]
        .email('[[ email ]]')
        [% endfor %]
        [% if post %]
        .post('[[ post ]]')
        [% endif %]
"#;

pub const RATE_ANOMALY: &str = r#"batch
    |	query('''
				select count("value") from "opentsdb"."retention_policy"./router.status.(5.*)/ where "fqdn" =~ /[[ app ]]/
    	''')
        .period(10m)
        .every(1m)
    |	eval(lambda: sigma("count"))
        .as('sigma')
        .keep('count', 'sigma')
    |	alert()
        [% if sigma %]
        .crit(lambda: "sigma" > [[ sigma ]])
        .warn(lambda: ("sigma" <= [[ sigma ]] AND "sigma" >= 0.1) )
        [% endif %]
        .stateChangesOnly()
        [% if slack %]
        .slack()
        .channel('[[ slack ]]')
        [% endif %]
        .message('[[ fqdn ]]: {{ if eq .Level "CRITICAL" }}Excessive 5xxs {{ end }}{{ if eq .Level "OK" }}5xxs back to normal {{ end }}{{ if eq .Level "INFO" }}5xxs Returning to Normal {{ end }}{{ if eq .Level "WARNING" }}Elevated 5xxs {{ end }} Metric: {{ .Name }}  Sigma: {{ index .Fields "sigma" | printf "%0.2f" }} Count: {{ index .Fields "count" }}')
        .details('''
					<h3>{{ .Message }}</h3>
					<p>Host: [[ fqdn ]]</p>
					[% if dashboard %]
					<a href="[[ dashboard ]]">Dashboard</a>
					[% endif %]
				''')
        [% for email in emails %]
        .email('[[ email ]]')
        [% endfor %]
        [% if post %]
        .post('[[ post ]]')
        [% endif %]
"#;

pub const CRASH_EVENT: &str = r#"batch
    |	query('''
				select text,title,app,tags from "opentsdb"."retention_policy"."events" where "app"='[[ app ]]' and "title"= 'crashed' and text ='App crashed' and tags =~ /[[ space ]],[[ short_app ]],/
    	''')
        .period(60s)
        .every(61s)
    |	alert()
        .warn(lambda: 1 > 0)
        [% if slack %]
        .slack()
        .channel('[[ slack ]]')
        [% endif %]
        .message('{{ index .Fields "app" }} crashed. Info: {{ index .Fields "tags" }}')
        .details('''
					<h3>{{ .Message }}</h3>
					{{ index .Fields "app" }} crashed. Info: {{ index .Fields "tags" }}
				''')
        [% for email in emails %]
        .email('[[ email ]]')
        [% endfor %]
        [% if post %]
        .post('[[ post ]]')
        [% endif %]
"#;

pub const RELEASE_EVENT: &str = r#"batch
    |	query('''
				select text,title,app from "opentsdb"."autogen"."events" where "app"='[[ app ]]' and "title"= 'released'
    	''')
        .period(60s)
        .every(61s)
    |	alert()
        .warn(lambda: 1 > 0)
        [% if slack %]
        .slack()
        .channel('[[ slack ]]')
        [% endif %]
        .message('{{ index .Fields "app" }} released.  New image is {{ index .Fields "text" }}')
        .details('''
					<h3>{{ .Message }}</h3>
					{{ index .Fields "app" }} released.  New image is {{ index .Fields "text" }}
				''')
        [% for email in emails %]
        .email('[[ email ]]')
        [% endfor %]
        [% if post %]
        .post('[[ post ]]')
        [% endif %]
"#;
